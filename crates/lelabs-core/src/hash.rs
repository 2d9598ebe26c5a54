/// Short content hash used for notification identity.
///
/// 32-bit rolling `h * 31 + unit` over UTF-16 code units with wrapping
/// arithmetic, rendered as lowercase hex of the absolute value. The same
/// input always yields the same string, which is all de-duplication needs.
pub fn content_hash(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    format!("{:x}", (hash as i64).abs())
}

/// Identity hash of a project update: `<projectId>-<title>-<date>`
pub fn update_hash(project_id: &str, title: &str, date: &str) -> String {
    content_hash(&format!("{}-{}-{}", project_id, title, date))
}
