/// Number of images per row: the largest of 5, 4, 3, 2 dividing `count`, else 1.
pub fn grid_columns(count: usize) -> usize {
    [5, 4, 3, 2]
        .into_iter()
        .find(|cols| count > 0 && count % cols == 0)
        .unwrap_or(1)
}

/// Renders image URLs as inline markdown, one grid row per line.
pub fn render_gallery(urls: &[&str]) -> String {
    if urls.is_empty() {
        return String::new();
    }

    urls.chunks(grid_columns(urls.len()))
        .map(|row| {
            row.iter()
                .map(|url| format!("![]({})", url))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
