// AI
//! 📊 progress.rs: "Are we there yet?", every extraction, every night, forever.
//!
//! 🚀 A bar while the pages come in, with a small comfy-table underneath for the
//! numbers a human actually wants: posts so far, pages so far, posts per second,
//! and how long this has been going on.
//!
//! ⚠️ Watching this progress bar will not make Reddit respond faster.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

/// 🔢 "1000000" → "1,000,000". For the people in the audience who like readability.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS if Reddit is having a really bad night.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 Progress for one extraction. A bar sized to the limit, or a spinner when
/// the limit is "whatever Reddit will give us".
pub(crate) struct FetchProgress {
    label: String,
    total_posts: u64,
    total_pages: u64,
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl std::fmt::Debug for FetchProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- ProgressBar doesn't derive Debug, and nobody wants to read one anyway
        f.debug_struct("FetchProgress")
            .field("label", &self.label)
            .field("total_posts", &self.total_posts)
            .field("total_pages", &self.total_pages)
            .finish()
    }
}

impl FetchProgress {
    /// 🚀 `visible = false` gives a hidden bar: same bookkeeping, no terminal output.
    pub(crate) fn new(label: String, limit: Option<u64>, visible: bool) -> Self {
        let progress_bar = match (visible, limit) {
            (false, _) => ProgressBar::hidden(),
            (true, Some(limit)) => {
                let bar = ProgressBar::new(limit);
                // -- the template is a literal, but a bad one just means the default style
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}]")
                {
                    bar.set_style(style.progress_chars("=>-"));
                }
                bar
            }
            (true, None) => {
                let spinner = ProgressBar::new_spinner();
                spinner.enable_steady_tick(Duration::from_millis(120));
                spinner
            }
        };

        Self {
            label,
            total_posts: 0,
            total_pages: 0,
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// 🔄 One more page arrived with `posts` posts on it.
    pub(crate) fn update(&mut self, posts: u64) {
        self.total_posts += posts;
        self.total_pages += 1;
        self.progress_bar.set_position(self.total_posts);
        self.render();
    }

    pub(crate) fn total_posts(&self) -> u64 {
        self.total_posts
    }

    /// ✅ Ring the bell.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    fn render(&self) {
        let elapsed = self.start_time.elapsed();
        let posts_per_sec = if elapsed.as_secs_f64() > 0.0 {
            self.total_posts as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} posts", format_number(self.total_posts)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} pages", format_number(self.total_pages)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{:.1} posts/s", posts_per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("source: {}\n{}", self.label, table));
    }
}
