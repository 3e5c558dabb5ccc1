use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {msg:<12} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Bar for a per-file stage; hidden when `visible` is false.
pub(crate) fn stage_progress(len: usize, visible: bool, stage: &'static str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let progress_bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress_bar.set_style(style);
    progress_bar.set_message(stage);
    progress_bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::with_template(TEMPLATE).is_ok());
    }

    #[test]
    fn test_hidden_bar_still_counts() {
        let progress_bar = stage_progress(3, false, "resize");
        progress_bar.inc(2);
        assert_eq!(progress_bar.position(), 2);
        assert!(progress_bar.is_hidden());
    }
}
