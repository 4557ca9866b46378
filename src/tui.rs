use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

/// Live spinners, one per segment crawl.
pub struct CrawlProgress {
    multi: MultiProgress,
}

impl CrawlProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    pub fn segment(&self, label: &str) -> SegmentProgress {
        let bar = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:<22.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        SegmentProgress { bar }
    }
}

impl Default for CrawlProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SegmentProgress {
    bar: ProgressBar,
}

impl SegmentProgress {
    /// Keeps the per-page log line above the spinners instead of tearing them.
    pub fn indexing(&self, url: &str) {
        let line = format!("Indexing page... {}", url);
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    pub fn update(&self, pages: usize, prices: usize) {
        self.bar
            .set_message(format!("{} pages, {} prices", pages, prices));
    }

    pub fn finish(&self, prices: usize, unparsed: usize) {
        let message = if unparsed > 0 {
            format!("done: {} prices ({} unparsed skipped)", prices, unparsed)
        } else {
            format!("done: {} prices", prices)
        };
        self.bar.finish_with_message(message);
    }

    pub fn fail(&self) {
        self.bar.abandon_with_message("failed");
    }
}

/// Prints the run summary, highlighting the `#` banner lines.
pub fn print_summary(summary: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    for line in summary.lines() {
        if line.starts_with('#') {
            execute!(
                stdout,
                SetForegroundColor(Color::Cyan),
                Print(line),
                ResetColor,
                Print("\n")
            )?;
        } else {
            execute!(stdout, Print(line), Print("\n"))?;
        }
    }
    Ok(())
}
