//! Modal, notification banner, and animated counters.
//!
//! Everything here is driven by explicit `Instant`s so the UI loop decides
//! when time passes.

use std::time::{Duration, Instant};

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use ic_core::{Difficulty, Project, Theme};

/// Delay before a new notification becomes visible.
pub const NOTIFICATION_SHOW_DELAY: Duration = Duration::from_millis(100);
/// Time after which each notification hides the banner.
pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);
/// Length of the stats count-up animation.
pub const COUNT_UP_DURATION: Duration = Duration::from_secs(2);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Banner background color.
    pub fn color(self) -> Color {
        match self {
            NotificationLevel::Success => Color::Rgb(0x10, 0xb9, 0x81),
            NotificationLevel::Info => Color::Rgb(0x3b, 0x82, 0xf6),
            NotificationLevel::Warning => Color::Rgb(0xf5, 0x9e, 0x0b),
            NotificationLevel::Error => Color::Rgb(0xef, 0x44, 0x44),
        }
    }
}

/// The single notification banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub level: NotificationLevel,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerEvent {
    Show,
    Hide,
}

/// Transient notifications.
///
/// The banner is created on first use. Each notification schedules its own
/// show and hide; an older hide still hides a newer message.
#[derive(Debug, Default)]
pub struct Notifier {
    banner: Option<Banner>,
    scheduled: Vec<(Instant, BannerEvent)>,
}

impl Notifier {
    /// Replace the banner message and schedule its show and hide.
    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel, now: Instant) {
        let banner = self.banner.get_or_insert_with(|| Banner {
            message: String::new(),
            level,
            visible: false,
        });
        banner.message = message.into();
        banner.level = level;
        self.scheduled.push((now + NOTIFICATION_SHOW_DELAY, BannerEvent::Show));
        self.scheduled.push((now + NOTIFICATION_DURATION, BannerEvent::Hide));
    }

    /// Apply every scheduled event due at `now`, oldest first.
    pub fn tick(&mut self, now: Instant) {
        self.scheduled.sort_by_key(|(at, _)| *at);
        let due = self.scheduled.iter().take_while(|(at, _)| *at <= now).count();
        let Some(banner) = self.banner.as_mut() else {
            return;
        };
        for (_, event) in self.scheduled.drain(..due) {
            banner.visible = event == BannerEvent::Show;
        }
    }

    /// The banner, once created.
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// The banner when it is currently shown.
    pub fn visible(&self) -> Option<&Banner> {
        self.banner.as_ref().filter(|banner| banner.visible)
    }
}

/// Project detail popup.
#[derive(Debug, Default)]
pub struct Modal {
    project: Option<Project>,
}

impl Modal {
    /// Show a project, replacing whatever was shown.
    pub fn show_detail(&mut self, project: Project) {
        self.project = Some(project);
    }

    /// Hide the popup.
    pub fn dismiss(&mut self) {
        self.project = None;
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.project.is_some()
    }
}

/// Integer count-up from zero to a target.
#[derive(Debug, Clone, Copy)]
pub struct CountUp {
    target: u64,
    started: Instant,
}

impl CountUp {
    pub fn new(target: u64, started: Instant) -> Self {
        Self { target, started }
    }

    /// Value at `now`. Zero targets stay at zero.
    pub fn value(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started);
        if self.target == 0 || elapsed >= COUNT_UP_DURATION {
            return self.target;
        }
        let scaled =
            u128::from(self.target) * elapsed.as_millis() / COUNT_UP_DURATION.as_millis();
        u64::try_from(scaled).unwrap_or(self.target)
    }
}

/// Icon, label, and color of a difficulty badge.
pub fn difficulty_badge(difficulty: Difficulty) -> (&'static str, &'static str, Color) {
    match difficulty {
        Difficulty::Easy => ("🟢", "Easy", Color::Green),
        Difficulty::Medium => ("🟡", "Medium", Color::Yellow),
        Difficulty::Hard => ("🔴", "Hard", Color::Red),
    }
}

/// Colors for a theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub selection: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            background: Color::Rgb(0xf8, 0xfa, 0xfc),
            foreground: Color::Rgb(0x1e, 0x29, 0x3b),
            muted: Color::Rgb(0x64, 0x74, 0x8b),
            accent: Color::Rgb(0x63, 0x66, 0xf1),
            selection: Color::Rgb(0xe2, 0xe8, 0xf0),
        },
        Theme::Dark => Palette {
            background: Color::Rgb(0x0f, 0x17, 0x2a),
            foreground: Color::Rgb(0xf1, 0xf5, 0xf9),
            muted: Color::Rgb(0x94, 0xa3, 0xb8),
            accent: Color::Rgb(0x81, 0x8c, 0xf8),
            selection: Color::Rgb(0x33, 0x41, 0x55),
        },
    }
}

const TIPS: [&str; 4] = [
    "Start with a simple prototype",
    "Split the project into small, achievable steps",
    "Look at similar projects for inspiration",
    "Adapt the scope to your level",
];

/// Badge spans shared by cards and the modal.
pub fn tag_spans(category: &str, difficulty: Difficulty) -> Vec<Span<'static>> {
    let (icon, label, color) = difficulty_badge(difficulty);
    vec![
        Span::raw(format!("📂 {category}")),
        Span::raw("  "),
        Span::styled(format!("{icon} {label}"), Style::default().fg(color)),
    ]
}

/// Content of the detail popup.
pub fn detail_lines(project: &Project, favorite: bool, palette: Palette) -> Vec<Line<'static>> {
    let muted = Style::default().fg(palette.muted);
    let key = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let favorite_action = if favorite {
        "💔 Remove from favorites"
    } else {
        "⭐ Add to favorites"
    };

    let mut lines = vec![
        Line::from(tag_spans(&project.category, project.difficulty)),
        Line::from(""),
        Line::from(Span::styled(
            project.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(project.description.clone()),
        Line::from(""),
        Line::from(Span::styled("💡 Getting started", Style::default().add_modifier(Modifier::BOLD))),
    ];
    lines.extend(TIPS.iter().map(|tip| Line::from(Span::styled(format!("  • {tip}"), muted))));
    lines.push(Line::from(""));
    for (shortcut, label) in [
        ("f", favorite_action),
        ("r", "🎲 Another random project"),
        ("e", "🔍 Explore all"),
        ("v", "📋 My favorites"),
        ("Esc", "Close"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(format!("[{shortcut}] "), key),
            Span::raw(label),
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(title: &str) -> Project {
        Project {
            title: title.into(),
            description: "desc".into(),
            category: "Games".into(),
            difficulty: Difficulty::Hard,
        }
    }

    #[test]
    fn banner_is_created_lazily() {
        let mut notifier = Notifier::default();
        notifier.tick(Instant::now());
        assert!(notifier.banner().is_none());

        let now = Instant::now();
        notifier.notify("Saved", NotificationLevel::Success, now);
        assert!(notifier.visible().is_none());
        notifier.tick(now + NOTIFICATION_SHOW_DELAY);
        assert_eq!(notifier.visible().map(|b| b.message.as_str()), Some("Saved"));
        notifier.tick(now + NOTIFICATION_DURATION);
        assert!(notifier.visible().is_none());
    }

    #[test]
    fn earlier_timer_hides_a_later_message() {
        let mut notifier = Notifier::default();
        let start = Instant::now();
        notifier.notify("first", NotificationLevel::Info, start);
        let second = start + Duration::from_secs(1);
        notifier.notify("second", NotificationLevel::Error, second);

        notifier.tick(second + NOTIFICATION_SHOW_DELAY);
        let banner = notifier.visible().expect("visible");
        assert_eq!(banner.message, "second");
        assert_eq!(banner.level, NotificationLevel::Error);

        notifier.tick(start + NOTIFICATION_DURATION);
        assert!(notifier.visible().is_none());
        assert_eq!(notifier.banner().map(|b| b.message.as_str()), Some("second"));

        notifier.tick(second + NOTIFICATION_DURATION);
        assert!(notifier.visible().is_none());
    }

    #[test]
    fn modal_replaces_and_dismisses() {
        let mut modal = Modal::default();
        modal.show_detail(project("Chess Engine"));
        modal.show_detail(project("Snake Game"));
        assert_eq!(modal.project().map(|p| p.title.as_str()), Some("Snake Game"));
        modal.dismiss();
        assert!(!modal.is_open());
    }

    #[test]
    fn count_up_is_linear_and_ends_on_target() {
        let start = Instant::now();
        let counter = CountUp::new(30, start);
        assert_eq!(counter.value(start), 0);
        assert_eq!(counter.value(start + Duration::from_secs(1)), 15);
        assert_eq!(counter.value(start + COUNT_UP_DURATION), 30);
        assert_eq!(CountUp::new(0, start).value(start), 0);
    }

    #[test]
    fn level_colors_are_fixed() {
        assert_eq!(NotificationLevel::Error.color(), Color::Rgb(0xef, 0x44, 0x44));
        assert_eq!(difficulty_badge(Difficulty::Medium).2, Color::Yellow);
    }

    #[test]
    fn detail_offers_the_matching_favorite_action() {
        let text = |favorite| -> String {
            detail_lines(&project("Chess Engine"), favorite, palette(Theme::Light))
                .iter()
                .flat_map(|line| line.spans.iter().map(|span| span.content.to_string()))
                .collect()
        };
        assert!(text(false).contains("Add to favorites"));
        assert!(text(true).contains("Remove from favorites"));
    }
}
