use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use provis_install::ProgressSink;

const PB_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent:>3}% {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

const LEN: u64 = 1000;

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Terminal progress bar fed by the install pipeline.
pub struct BarSink {
    pb: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let pb = ProgressBar::new(LEN);
        if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.set_style(style.clone());
        }
        Self { pb }
    }

    pub fn finish(&self, msg: impl Into<String>) {
        self.pb.finish_with_message(msg.into());
    }

    pub fn abandon(&self, msg: impl Into<String>) {
        self.pb.abandon_with_message(msg.into());
    }
}

impl ProgressSink for BarSink {
    fn progress(&self, fraction: f64) {
        self.pb.set_position((fraction.clamp(0.0, 1.0) * LEN as f64).round() as u64);
    }

    fn status(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }
}
