use anyhow::Context as _;
use clap::Parser;
use lelabs_api::{BillingClient, Product, RetryConfig};
use lelabs_core::gallery::{self, YourNews};
use lelabs_core::routes::{self, PageView};
use lelabs_core::{
    BillingService, CatalogProvider, CatalogSource, Clock, Config, DismissPolicy,
    EmbeddedCatalogSource, FileCatalogSource, HttpCatalogSource, LabsData, MemoryBackend,
    NotificationCenter, PreferenceStore, Project, ProjectFilter, ProjectStatus, Route,
    SnapshotSource, SystemClock, ThemePreference,
};
use lelabs_store::RecordStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lelabs")]
#[command(version, about = "Browse LE LABS projects and follow their updates", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Skip the network and use the bundled catalog snapshot
    #[arg(long, global = true)]
    offline: bool,

    /// Session token for checkout
    #[arg(long, global = true, env = "LELABS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List projects in gallery order
    Projects {
        /// Only projects with this status (planning, active, paused, completed)
        #[arg(long)]
        status: Option<String>,
        /// Only projects carrying this tag ("all" for any)
        #[arg(long)]
        tag: Option<String>,
        /// Only projects you follow
        #[arg(long)]
        followed: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resolve a site path such as /projects/atlas and print the page
    Show {
        /// Path to open
        path: String,
    },
    /// Follow a project by id or slug
    Follow { project: String },
    /// Stop following a project by id or slug
    Unfollow { project: String },
    /// List notifications for followed projects
    Notifications {
        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,
    },
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Dismiss a notification
    Dismiss { id: String },
    /// Unread updates of the projects you follow
    Feed,
    /// One-time credit packs
    Products,
    /// Recurring plans
    Subscriptions,
    /// Start a checkout session for a product and open it in the browser
    Checkout {
        product_id: String,
        /// Print the URL without opening a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Show or change display preferences
    Prefs {
        /// default or high-contrast
        #[arg(long)]
        theme: Option<String>,
        /// Stop tiles from rotating on their own
        #[arg(long)]
        reduced_motion: Option<bool>,
    },
    /// Open the terminal gallery (default)
    Tui,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tui = matches!(cli.command, None | Some(Commands::Tui));

    // Initialize logging; the TUI owns the terminal so it stays quiet
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lelabs=info".into()),
        )
        .with((!tui).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut preferences = open_preferences(&config, cli.ephemeral, clock.clone())?;
    let mut catalog = build_catalog(&config, cli.offline)?;
    let mut notifications = NotificationCenter::new(config.notifications.dismiss_policy);

    match cli.command {
        None | Some(Commands::Tui) => {
            let app = lelabs_tui::App::new(catalog, preferences, notifications, clock);
            lelabs_tui::run_tui(app, &config.ui).await?;
        }
        Some(Commands::Projects {
            status,
            tag,
            followed,
            json,
        }) => {
            let data = load_catalog(&mut catalog).await?;
            let status = status
                .map(|s| {
                    ProjectStatus::parse(&s).with_context(|| format!("Unknown status: {}", s))
                })
                .transpose()?;
            let filter = ProjectFilter::new()
                .status(status)
                .tag(tag)
                .followed_only(followed);
            let projects = filter.apply(&data.projects, preferences.preferences());

            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                print_projects(&projects, &preferences);
            }
        }
        Some(Commands::Show { path }) => {
            let data = load_catalog(&mut catalog).await?;
            let route = Route::parse(&path);
            info!("Opening {}", route);
            print_page(&routes::visit(&route, &data, &mut preferences), &data, &preferences);
        }
        Some(Commands::Follow { project }) => {
            let data = load_catalog(&mut catalog).await?;
            let project = find_project(&data, &project)?;
            if preferences.follow(&project.id)? {
                println!("Following {}", project.title);
            } else {
                println!("Already following {}", project.title);
            }
        }
        Some(Commands::Unfollow { project }) => {
            let data = load_catalog(&mut catalog).await?;
            // Unknown ids are still accepted so stale follows can be removed
            let id = data
                .project(&project)
                .or_else(|| data.project_by_slug(&project))
                .map(|p| p.id.clone())
                .unwrap_or(project);
            if preferences.unfollow(&id)? {
                println!("Unfollowed {}", id);
            } else {
                println!("Not following {}", id);
            }
        }
        Some(Commands::Notifications { json }) => {
            let data = load_catalog(&mut catalog).await?;
            notifications.sync(&data, catalog.generation(), &preferences, clock.now());
            if json {
                println!("{}", serde_json::to_string_pretty(notifications.notifications())?);
            } else if notifications.notifications().is_empty() {
                println!("No notifications");
            } else {
                println!("{} unread", notifications.unread_count());
                for n in notifications.notifications() {
                    println!(
                        "{} {}  {}  {}: {}",
                        if n.read { " " } else { "●" },
                        n.id,
                        n.update.date.format("%Y-%m-%d"),
                        n.project_title,
                        n.update.title
                    );
                }
            }
        }
        Some(Commands::Read { id }) => {
            let data = load_catalog(&mut catalog).await?;
            notifications.sync(&data, catalog.generation(), &preferences, clock.now());
            if notifications.mark_as_read(&id, &mut preferences)? {
                println!("Marked {} as read", id);
            } else {
                println!("No unread notification {}", id);
            }
        }
        Some(Commands::ReadAll) => {
            let data = load_catalog(&mut catalog).await?;
            notifications.sync(&data, catalog.generation(), &preferences, clock.now());
            let projects = notifications.mark_all_as_read(&mut preferences)?;
            println!("Caught up on {} project(s)", projects);
        }
        Some(Commands::Dismiss { id }) => {
            let data = load_catalog(&mut catalog).await?;
            notifications.sync(&data, catalog.generation(), &preferences, clock.now());
            if !notifications.dismiss(&id, &mut preferences)? {
                println!("No notification {}", id);
            } else if notifications.policy() == DismissPolicy::RemindLater {
                println!("Dismissed {} (it returns next run until read)", id);
            } else {
                println!("Dismissed {}", id);
            }
        }
        Some(Commands::Feed) => {
            let data = load_catalog(&mut catalog).await?;
            match gallery::your_news(&data, preferences.preferences()) {
                YourNews::NotFollowing => println!("You are not following any projects yet."),
                YourNews::NothingNew => println!("You're all caught up."),
                YourNews::Updates(entries) => {
                    for entry in entries {
                        println!(
                            "{}  {}\n    {}\n    {}",
                            entry.date.format("%Y-%m-%d"),
                            entry.title,
                            entry.summary,
                            Route::ProjectDetail(entry.project_slug).path()
                        );
                    }
                }
            }
        }
        Some(Commands::Products) => {
            let mut billing = billing_service(&config, cli.access_token, clock)?;
            print_products("Credit packs", billing.products().await?);
        }
        Some(Commands::Subscriptions) => {
            let mut billing = billing_service(&config, cli.access_token, clock)?;
            print_products("Plans", billing.subscriptions().await?);
        }
        Some(Commands::Checkout {
            product_id,
            no_open,
        }) => {
            let billing = billing_service(&config, cli.access_token, clock)?;
            if !billing.is_signed_in() {
                warn!("No access token set, checkout may be rejected");
            }
            let url = billing.checkout(&product_id).await?;
            println!("{}", url);
            if !no_open {
                open::that(&url).context("Failed to open browser")?;
            }
        }
        Some(Commands::Prefs {
            theme,
            reduced_motion,
        }) => {
            if let Some(theme) = theme {
                let theme = ThemePreference::parse(&theme)
                    .with_context(|| format!("Unknown theme: {}", theme))?;
                preferences.set_theme(theme)?;
            }
            if let Some(reduced) = reduced_motion {
                preferences.set_reduced_motion(reduced)?;
            }
            let prefs = preferences.preferences();
            println!("theme:          {}", prefs.theme.as_str());
            println!("reduced motion: {}", prefs.reduced_motion);
            println!("following:      {}", prefs.followed_projects.len());
        }
    }

    Ok(())
}

/// Preferences on disk, or in memory when asked to or when the disk is unusable
fn open_preferences(
    config: &Config,
    ephemeral: bool,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<PreferenceStore> {
    if ephemeral {
        return Ok(PreferenceStore::open(Box::new(MemoryBackend::new()), clock)?);
    }

    let opened = config
        .storage
        .database_path()
        .map_err(anyhow::Error::from)
        .and_then(|path| Ok(RecordStore::open(path)?))
        .and_then(|store| Ok(PreferenceStore::open(Box::new(store), clock.clone())?));

    match opened {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("Preference storage unavailable, keeping preferences in memory: {}", e);
            Ok(PreferenceStore::open(Box::new(MemoryBackend::new()), clock)?)
        }
    }
}

fn build_catalog(config: &Config, offline: bool) -> anyhow::Result<CatalogProvider> {
    let fallback: Box<dyn CatalogSource> = match &config.data.fallback_path {
        Some(path) => Box::new(FileCatalogSource::new(path)),
        None => Box::new(EmbeddedCatalogSource),
    };
    let primary: Box<dyn CatalogSource> = if offline {
        Box::new(EmbeddedCatalogSource)
    } else {
        Box::new(HttpCatalogSource::new(config.data.primary_url.clone())?)
    };
    Ok(CatalogProvider::new(primary, fallback))
}

async fn load_catalog(catalog: &mut CatalogProvider) -> anyhow::Result<Arc<LabsData>> {
    if catalog.load().await? == SnapshotSource::Fallback {
        warn!("Catalog unreachable, showing the bundled snapshot");
    }
    catalog
        .data()
        .context("Catalog loaded without a snapshot")
}

fn billing_service(
    config: &Config,
    access_token: Option<String>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<BillingService> {
    let client = BillingClient::new(&config.billing.products_url, &config.billing.checkout_url)?
        .with_retry_config(RetryConfig::with_max_retries(config.billing.retry_count));
    Ok(BillingService::new(client, clock)
        .with_access_token(access_token)
        .with_stale_after(config.billing.stale_after()))
}

fn find_project<'a>(data: &'a LabsData, key: &str) -> anyhow::Result<&'a Project> {
    data.project(key)
        .or_else(|| data.project_by_slug(key))
        .with_context(|| format!("No project with id or slug {}", key))
}

fn print_projects(projects: &[&Project], preferences: &PreferenceStore) {
    if projects.is_empty() {
        println!("No projects match");
        return;
    }
    for project in projects {
        let marker = if gallery::has_new_updates(project, preferences.preferences()) {
            "●"
        } else if preferences.is_following(&project.id) {
            "★"
        } else {
            " "
        };
        println!(
            "{} {:<14} {:<10} {:<24} {}",
            marker,
            project.id,
            project.status.as_str(),
            project.title,
            project.tags.join(", ")
        );
    }
}

fn print_page(view: &PageView<'_>, data: &LabsData, preferences: &PreferenceStore) {
    match view {
        PageView::Home(home) => {
            println!("{}\n", home.page.title);
            for project in &home.featured {
                println!("  * {}: {}", project.title, project.summary);
            }
            for item in home.latest_news.iter().take(3) {
                println!("  {}  {}", item.date.format("%Y-%m-%d"), item.title);
            }
        }
        PageView::Projects(projects) => {
            let all: Vec<&Project> = projects.iter().collect();
            print_projects(&all, preferences);
        }
        PageView::ProjectDetail(project) => {
            println!("{} ({})", project.title, project.status);
            println!("{}\n", project.description);
            for update in &project.updates {
                println!("  {}  {}", update.date.format("%Y-%m-%d"), update.title);
            }
            for (label, url) in project.link_entries() {
                println!("  {:<8} {}", label, url);
            }
        }
        PageView::Content(page) => {
            println!("{}", page.title);
            if let Some(subtitle) = &page.subtitle {
                println!("{}", subtitle);
            }
            println!("\n{}", page.description);
        }
        PageView::YourNews => match gallery::your_news(data, preferences.preferences()) {
            YourNews::Updates(entries) => {
                for entry in entries {
                    println!("{}  {}", entry.date.format("%Y-%m-%d"), entry.title);
                }
            }
            _ => println!("Nothing new"),
        },
        PageView::Login => println!("Sign in on the website to buy credits."),
        PageView::Account => println!("Account details are only available on the website."),
        PageView::BillingSuccess => println!("Payment received, thank you."),
        PageView::NotFound => println!("Page not found"),
    }
}

fn print_products(heading: &str, products: &[Product]) {
    println!("{}", heading);
    if products.is_empty() {
        println!("  none available");
    }
    for product in products {
        println!(
            "  {:<20} {:>6} credits  {:>8.2} {}{}",
            product.id,
            product.credits + product.metadata.bonus,
            product.price.amount as f64 / 100.0,
            product.price.currency.to_uppercase(),
            if product.metadata.popular { "  popular" } else { "" }
        );
    }
}
