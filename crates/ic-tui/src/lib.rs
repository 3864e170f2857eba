use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use ic_client::HttpCatalog;
use ic_core::{
    CatalogFilters, CatalogSource, CoreError, CoreResult, Difficulty, Favorite, KeyValueStore,
    Project, Stats, Theme, Vocabularies,
};
use ic_engine::{
    load_catalog_vocabularies, LoadOutcome, PageView, ProjectRequest, RequestToken, ViewState,
};
use ic_store::{FavoriteChange, FavoritesStore, FsStore, Preferences};
use ic_utils::{capitalize, results_count_label};

mod presenter;

use presenter::{
    detail_lines, palette, tag_spans, CountUp, Modal, NotificationLevel, Notifier, Palette,
};

const TICK_RATE: Duration = Duration::from_millis(100);
const WELCOME_DELAY: Duration = Duration::from_secs(2);
const WELCOME_MESSAGE: &str =
    "👋 Welcome to InspiCode! Press f on a project to save it to your favorites.";

/// Where the TUI finds the backend and its local storage.
#[derive(Debug, Clone)]
pub struct TuiOptions {
    pub api_url: String,
    pub data_dir: PathBuf,
}

/// Persistent state the UI reads and writes.
struct Stores<S> {
    favorites: FavoritesStore<S>,
    preferences: Preferences<S>,
}

impl<S: KeyValueStore + Clone> Stores<S> {
    pub fn new(store: S) -> Self {
        Self {
            favorites: FavoritesStore::new(store.clone()),
            preferences: Preferences::new(store),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Explore,
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    None,
    Search,
}

/// Network work requested by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    LoadVocabularies,
    LoadProjects(ProjectRequest),
    LoadRandom,
    LoadStats,
}

/// Network results handed back to the UI thread.
#[derive(Debug)]
enum Fetched {
    Vocabularies(Vocabularies),
    Projects {
        token: RequestToken,
        result: CoreResult<Vec<Project>>,
    },
    Random(CoreResult<Project>),
    Stats(CoreResult<Stats>),
}

#[derive(Debug, Default, Clone)]
struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    fn byte_offset(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map_or(self.content.len(), |(offset, _)| offset)
    }

    fn insert(&mut self, c: char) {
        let offset = self.byte_offset();
        self.content.insert(offset, c);
        self.cursor += 1;
    }

    fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset();
            self.content.remove(offset);
        }
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        if self.cursor < self.content.chars().count() {
            self.cursor += 1;
        }
    }

    fn reset(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }
}

#[derive(Debug)]
struct App {
    tab: Tab,
    input_mode: InputMode,
    search_input: TextInput,
    view: ViewState,
    vocab: Vocabularies,
    category_index: usize,
    difficulty_index: usize,
    card_state: ListState,
    favorites_state: ListState,
    favorites: Vec<Favorite>,
    modal: Modal,
    notifier: Notifier,
    theme: Theme,
    stats: Option<(CountUp, CountUp)>,
    show_help: bool,
    loading: bool,
    welcome_at: Option<Instant>,
    effects: Vec<Effect>,
}

impl App {
    fn new(theme: Theme, favorites: Vec<Favorite>) -> Self {
        let mut favorites_state = ListState::default();
        if !favorites.is_empty() {
            favorites_state.select(Some(0));
        }
        Self {
            tab: Tab::Explore,
            input_mode: InputMode::None,
            search_input: TextInput::default(),
            view: ViewState::new(),
            vocab: Vocabularies::default(),
            category_index: 0,
            difficulty_index: 0,
            card_state: ListState::default(),
            favorites_state,
            favorites,
            modal: Modal::default(),
            notifier: Notifier::default(),
            theme,
            stats: None,
            show_help: false,
            loading: false,
            welcome_at: None,
            effects: Vec::new(),
        }
    }

    /// Queue the initial fetches and the first-visit welcome.
    fn start(&mut self, now: Instant, welcomed: bool) {
        self.effects.push(Effect::LoadVocabularies);
        self.effects.push(Effect::LoadStats);
        self.reload();
        if self.favorites.is_empty() && !welcomed {
            self.welcome_at = Some(now + WELCOME_DELAY);
        }
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn selected_category(&self) -> Option<String> {
        self.category_index
            .checked_sub(1)
            .and_then(|index| self.vocab.categories.get(index).cloned())
    }

    fn difficulty_options(&self) -> Vec<Difficulty> {
        self.vocab
            .difficulties
            .iter()
            .filter_map(|value| value.parse().ok())
            .collect()
    }

    fn selected_difficulty(&self) -> Option<Difficulty> {
        self.difficulty_index
            .checked_sub(1)
            .and_then(|index| self.difficulty_options().get(index).copied())
    }

    fn reload(&mut self) {
        let filters = CatalogFilters::new(self.selected_category(), self.selected_difficulty(), None);
        let request = self.view.issue_request(filters);
        self.loading = true;
        self.effects.push(Effect::LoadProjects(request));
    }

    fn cycle_category(&mut self) {
        let count = self.vocab.categories.len() + 1;
        self.category_index = (self.category_index + 1) % count;
        self.reload();
    }

    fn cycle_difficulty(&mut self) {
        let count = self.difficulty_options().len() + 1;
        self.difficulty_index = (self.difficulty_index + 1) % count;
        self.reload();
    }

    fn clear_filters(&mut self) {
        self.category_index = 0;
        self.difficulty_index = 0;
        self.search_input.reset();
        let request = self.view.clear_filters();
        self.loading = true;
        self.effects.push(Effect::LoadProjects(request));
    }

    fn search_changed(&mut self) {
        self.view.apply_local_search(&self.search_input.content);
        self.reset_card_selection();
    }

    fn reset_card_selection(&mut self) {
        let selected = (!self.view.page_slice().is_empty()).then_some(0);
        self.card_state.select(selected);
    }

    fn selected_card(&self) -> Option<Project> {
        let index = self.card_state.selected()?;
        self.view.page_slice().get(index).cloned()
    }

    fn selected_favorite(&self) -> Option<&Favorite> {
        let index = self.favorites_state.selected()?;
        self.favorites.get(index)
    }

    fn is_favorite(&self, title: &str) -> bool {
        self.favorites.iter().any(|favorite| favorite.title == title)
    }

    fn next_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Explore => Tab::Favorites,
            Tab::Favorites => Tab::Explore,
        };
    }

    fn select_next(list_state: &mut ListState, len: usize) {
        if len == 0 {
            list_state.select(None);
            return;
        }
        let i = match list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        list_state.select(Some(i));
    }

    fn select_prev(list_state: &mut ListState, len: usize) {
        if len == 0 {
            list_state.select(None);
            return;
        }
        let i = match list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        list_state.select(Some(i));
    }
}

pub fn run(options: TuiOptions) -> Result<()> {
    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(&options.api_url).context("invalid api url")?);
    let stores = Stores::new(FsStore::new(options.data_dir.clone()));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize runtime")?;
    let (tx, rx) = mpsc::channel();

    let mut app = App::new(stores.preferences.theme(), stores.favorites.list());
    app.start(Instant::now(), stores.preferences.is_welcomed());
    info!(api_url = %options.api_url, data_dir = %options.data_dir.display(), "tui started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &stores, &runtime, &catalog, &tx, &rx);
    restore_terminal(terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<Stdout>>,
    app: &mut App,
    stores: &Stores<FsStore>,
    runtime: &Runtime,
    catalog: &Arc<dyn CatalogSource>,
    tx: &Sender<Fetched>,
    rx: &Receiver<Fetched>,
) -> Result<()> {
    loop {
        dispatch(runtime, catalog, tx, app.take_effects());
        while let Ok(fetched) = rx.try_recv() {
            apply_fetched(app, fetched, Instant::now());
        }
        on_tick(app, stores, Instant::now());

        let now = Instant::now();
        terminal.draw(|frame| render_app(frame, app, now))?;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, stores, key, Instant::now()) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(app, mouse, terminal.size()?),
                _ => {}
            }
        }
    }
}

fn dispatch(
    runtime: &Runtime,
    catalog: &Arc<dyn CatalogSource>,
    tx: &Sender<Fetched>,
    effects: Vec<Effect>,
) {
    for effect in effects {
        let catalog = Arc::clone(catalog);
        let tx = tx.clone();
        runtime.spawn(async move {
            let fetched = match effect {
                Effect::LoadVocabularies => {
                    Fetched::Vocabularies(load_catalog_vocabularies(catalog.as_ref()).await)
                }
                Effect::LoadProjects(request) => Fetched::Projects {
                    token: request.token,
                    result: catalog.projects(&request.filters).await,
                },
                Effect::LoadRandom => {
                    Fetched::Random(catalog.random(&CatalogFilters::default()).await)
                }
                Effect::LoadStats => Fetched::Stats(catalog.stats().await),
            };
            // The receiver is gone once the UI has exited.
            let _ = tx.send(fetched);
        });
    }
}

fn apply_fetched(app: &mut App, fetched: Fetched, now: Instant) {
    match fetched {
        Fetched::Vocabularies(vocab) => app.vocab = vocab,
        Fetched::Projects { token, result } => match app.view.complete_request(token, result) {
            LoadOutcome::Applied { .. } => {
                app.loading = false;
                app.reset_card_selection();
            }
            LoadOutcome::Failed => app.loading = false,
            LoadOutcome::Stale => {}
        },
        Fetched::Random(Ok(project)) => app.modal.show_detail(project),
        Fetched::Random(Err(CoreError::Api { detail, .. })) => {
            app.notifier
                .notify(format!("Error: {detail}"), NotificationLevel::Error, now);
        }
        Fetched::Random(Err(err)) => {
            error!(error = %err, "failed to fetch a random project");
            app.notifier
                .notify("Connection error", NotificationLevel::Error, now);
        }
        Fetched::Stats(Ok(stats)) => {
            app.stats = Some((
                CountUp::new(stats.total_projects, now),
                CountUp::new(stats.categories, now),
            ));
        }
        Fetched::Stats(Err(err)) => error!(error = %err, "failed to load stats"),
    }
}

fn on_tick<S: KeyValueStore>(app: &mut App, stores: &Stores<S>, now: Instant) {
    if app.welcome_at.is_some_and(|at| at <= now) {
        app.welcome_at = None;
        app.notifier
            .notify(WELCOME_MESSAGE, NotificationLevel::Info, now);
        if let Err(err) = stores.preferences.mark_welcomed() {
            warn!(error = %err, "failed to record welcome");
        }
    }
    app.notifier.tick(now);
}

fn toggle_favorite<S: KeyValueStore>(
    app: &mut App,
    stores: &Stores<S>,
    project: &Project,
    now: Instant,
) {
    let outcome = stores.favorites.toggle(project, Utc::now());
    app.favorites = stores.favorites.list();
    if app.favorites_state.selected().map_or(true, |i| i >= app.favorites.len()) {
        let selected = (!app.favorites.is_empty()).then_some(0);
        app.favorites_state.select(selected);
    }

    if !outcome.persisted {
        app.notifier
            .notify("Could not save your favorites", NotificationLevel::Error, now);
        return;
    }
    match outcome.change {
        FavoriteChange::Added => {
            app.notifier
                .notify("⭐ Project added to favorites!", NotificationLevel::Success, now);
        }
        FavoriteChange::Removed => {
            app.notifier
                .notify("💔 Project removed from favorites", NotificationLevel::Info, now);
        }
    }
}

fn toggle_theme<S: KeyValueStore>(app: &mut App, stores: &Stores<S>, now: Instant) {
    app.theme = app.theme.toggled();
    if let Err(err) = stores.preferences.set_theme(app.theme) {
        warn!(error = %err, "failed to save theme");
        app.notifier
            .notify("Theme could not be saved", NotificationLevel::Warning, now);
        return;
    }
    let message = match app.theme {
        Theme::Dark => "Dark mode enabled",
        Theme::Light => "Light mode enabled",
    };
    app.notifier.notify(message, NotificationLevel::Info, now);
}

fn handle_key<S: KeyValueStore>(
    app: &mut App,
    stores: &Stores<S>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return true,
            KeyCode::Char('r') => {
                app.effects.push(Effect::LoadRandom);
                return false;
            }
            _ => {}
        }
    }
    if app.input_mode == InputMode::Search {
        handle_search_input(app, key);
        return false;
    }
    if app.modal.is_open() {
        handle_modal_key(app, stores, key, now);
        return false;
    }
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.show_help = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Tab | KeyCode::BackTab => app.next_tab(),
        KeyCode::Char('r') => app.effects.push(Effect::LoadRandom),
        KeyCode::Char('t') => toggle_theme(app, stores, now),
        _ => match app.tab {
            Tab::Explore => handle_explore_key(app, stores, key, now),
            Tab::Favorites => handle_favorites_key(app, stores, key, now),
        },
    }
    false
}

fn handle_explore_key<S: KeyValueStore>(
    app: &mut App,
    stores: &Stores<S>,
    key: KeyEvent,
    now: Instant,
) {
    let len = app.view.page_slice().len();
    match key.code {
        KeyCode::Char('/') => app.input_mode = InputMode::Search,
        KeyCode::Char('c') => app.cycle_category(),
        KeyCode::Char('d') => app.cycle_difficulty(),
        KeyCode::Char('x') => app.clear_filters(),
        KeyCode::Down | KeyCode::Char('j') => App::select_next(&mut app.card_state, len),
        KeyCode::Up | KeyCode::Char('k') => App::select_prev(&mut app.card_state, len),
        KeyCode::Right | KeyCode::Char('n') | KeyCode::PageDown => {
            app.view.next_page();
            app.reset_card_selection();
        }
        KeyCode::Left | KeyCode::Char('p') | KeyCode::PageUp => {
            app.view.previous_page();
            app.reset_card_selection();
        }
        KeyCode::Home => {
            app.view.set_page(1);
            app.reset_card_selection();
        }
        KeyCode::End => {
            app.view.set_page(app.view.total_pages());
            app.reset_card_selection();
        }
        KeyCode::Enter => {
            if let Some(project) = app.selected_card() {
                app.modal.show_detail(project);
            }
        }
        KeyCode::Char('f') => {
            if let Some(project) = app.selected_card() {
                toggle_favorite(app, stores, &project, now);
            }
        }
        _ => {}
    }
}

fn handle_favorites_key<S: KeyValueStore>(
    app: &mut App,
    stores: &Stores<S>,
    key: KeyEvent,
    now: Instant,
) {
    let len = app.favorites.len();
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => App::select_next(&mut app.favorites_state, len),
        KeyCode::Up | KeyCode::Char('k') => App::select_prev(&mut app.favorites_state, len),
        KeyCode::Enter => {
            if let Some(project) = app.selected_favorite().map(Favorite::to_project) {
                app.modal.show_detail(project);
            }
        }
        KeyCode::Char('f' | 'x') => {
            if let Some(project) = app.selected_favorite().map(Favorite::to_project) {
                toggle_favorite(app, stores, &project, now);
            }
        }
        _ => {}
    }
}

fn handle_modal_key<S: KeyValueStore>(
    app: &mut App,
    stores: &Stores<S>,
    key: KeyEvent,
    now: Instant,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.modal.dismiss(),
        KeyCode::Char('f') => {
            if let Some(project) = app.modal.project().cloned() {
                toggle_favorite(app, stores, &project, now);
            }
        }
        KeyCode::Char('r') => app.effects.push(Effect::LoadRandom),
        KeyCode::Char('v') => {
            app.modal.dismiss();
            app.tab = Tab::Favorites;
        }
        KeyCode::Char('e') => {
            app.modal.dismiss();
            app.tab = Tab::Explore;
            app.clear_filters();
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.input_mode = InputMode::None,
        KeyCode::Esc => {
            app.input_mode = InputMode::None;
            app.search_input.reset();
            app.search_changed();
        }
        KeyCode::Char(c) => {
            app.search_input.insert(c);
            app.search_changed();
        }
        KeyCode::Backspace => {
            app.search_input.delete_back();
            app.search_changed();
        }
        KeyCode::Left => app.search_input.move_left(),
        KeyCode::Right => app.search_input.move_right(),
        _ => {}
    }
}

/// A click on the backdrop outside the detail box closes it.
fn handle_mouse(app: &mut App, mouse: MouseEvent, area: Rect) {
    if !app.modal.is_open() {
        return;
    }
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let content = modal_rect(area);
    let inside = mouse.column >= content.x
        && mouse.column < content.x + content.width
        && mouse.row >= content.y
        && mouse.row < content.y + content.height;
    if !inside {
        app.modal.dismiss();
    }
}

fn render_app(frame: &mut Frame, app: &App, now: Instant) {
    let size = frame.size();
    let colors = palette(app.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.background).fg(colors.foreground)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(size);

    render_header(frame, chunks[0], app, colors, now);
    match app.tab {
        Tab::Explore => render_explore(frame, chunks[1], app, colors),
        Tab::Favorites => render_favorites(frame, chunks[1], app, colors),
    }
    render_guide_bar(frame, chunks[2], app, colors);

    if app.show_help {
        render_help_popup(frame, size);
    }
    if let Some(project) = app.modal.project() {
        let area = modal_rect(size);
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(detail_lines(project, app.is_favorite(&project.title), colors))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Project")
                    .border_style(Style::default().fg(colors.accent)),
            )
            .style(Style::default().bg(colors.background).fg(colors.foreground))
            .wrap(Wrap { trim: false });
        frame.render_widget(detail, area);
    }
    render_banner(frame, size, app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, colors: Palette, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let titles = vec![
        Line::from("Explore"),
        Line::from(format!("Favorites ({})", app.favorites.len())),
    ];
    let tabs = Tabs::new(titles)
        .select(match app.tab {
            Tab::Explore => 0,
            Tab::Favorites => 1,
        })
        .block(Block::default().borders(Borders::ALL).title("InspiCode"))
        .highlight_style(
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[0]);

    let stats = match &app.stats {
        Some((projects, categories)) => format!(
            "{} projects · {} categories",
            projects.value(now),
            categories.value(now)
        ),
        None => String::new(),
    };
    let stats = Paragraph::new(stats)
        .style(Style::default().fg(colors.muted))
        .block(Block::default().borders(Borders::ALL).title("Catalog"));
    frame.render_widget(stats, chunks[1]);
}

fn render_explore(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let controls = app.view.pagination_controls();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(if controls.is_some() { 3 } else { 0 }),
            ]
            .as_ref(),
        )
        .split(area);

    let category = app.selected_category().unwrap_or_else(|| "All".into());
    let difficulty = app
        .selected_difficulty()
        .map_or_else(|| "All".into(), |d| capitalize(d.as_str()));
    let mut search = app.search_input.content.clone();
    if app.input_mode == InputMode::Search {
        search.push('█');
    }
    let mut count = results_count_label(app.view.filtered_projects().len());
    if app.loading {
        count.push_str("  (loading…)");
    }
    let filters = Paragraph::new(vec![
        Line::from(format!(
            "Category: {category}   Difficulty: {difficulty}   Search: {search}"
        )),
        Line::from(Span::styled(count, Style::default().fg(colors.muted))),
    ])
    .block(Block::default().borders(Borders::ALL).title("Filters"));
    frame.render_widget(filters, chunks[0]);

    match app.view.render_page(&app.favorites) {
        PageView::Cards(cards) => {
            let items = cards
                .into_iter()
                .map(|card| {
                    let star = if card.favorite {
                        Span::styled("★ ", Style::default().fg(Color::Yellow))
                    } else {
                        Span::raw("☆ ")
                    };
                    let mut header = vec![
                        star,
                        Span::styled(card.title, Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw("   "),
                    ];
                    header.extend(tag_spans(&card.category, card.difficulty));
                    ListItem::new(Text::from(vec![
                        Line::from(header),
                        Line::from(Span::styled(
                            format!("   {}", card.excerpt),
                            Style::default().fg(colors.muted),
                        )),
                    ]))
                })
                .collect::<Vec<_>>();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Projects"))
                .highlight_style(Style::default().bg(colors.selection));
            frame.render_stateful_widget(list, chunks[1], &mut app.card_state.clone());
        }
        PageView::Empty(empty) => {
            let placeholder = Paragraph::new(vec![
                Line::from(Span::styled(
                    empty.heading,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(empty.hint, Style::default().fg(colors.muted))),
                Line::from(""),
                Line::from(vec![
                    Span::styled("[x] ", Style::default().fg(colors.accent)),
                    Span::raw(empty.action),
                ]),
            ])
            .block(Block::default().borders(Borders::ALL).title("Projects"));
            frame.render_widget(placeholder, chunks[1]);
        }
    }

    if let Some(controls) = controls {
        let mut spans = Vec::new();
        if controls.previous.is_some() {
            spans.push(Span::raw("← Prev  "));
        }
        for page in &controls.pages {
            if page.active {
                spans.push(Span::styled(
                    format!("[{}]", page.number),
                    Style::default()
                        .fg(colors.accent)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(format!(" {} ", page.number)));
            }
        }
        if controls.next.is_some() {
            spans.push(Span::raw("  Next →"));
        }
        spans.push(Span::styled(
            format!("   Page {}/{}", app.view.current_page(), controls.total),
            Style::default().fg(colors.muted),
        ));
        let pagination =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(pagination, chunks[2]);
    }
}

fn render_favorites(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    if app.favorites.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                "No favorites yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Press f on a project to save it here.",
                Style::default().fg(colors.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Favorites"));
        frame.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let items = app
        .favorites
        .iter()
        .map(|favorite| ListItem::new(format!("★ {}", favorite.title)))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Favorites"))
        .highlight_style(Style::default().bg(colors.selection));
    frame.render_stateful_widget(list, chunks[0], &mut app.favorites_state.clone());

    let detail = match app.selected_favorite() {
        Some(favorite) => Paragraph::new(vec![
            Line::from(tag_spans(&favorite.category, favorite.difficulty)),
            Line::from(""),
            Line::from(Span::styled(
                favorite.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(favorite.description.clone()),
            Line::from(""),
            Line::from(Span::styled(
                format!("Added {}", favorite.added_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(colors.muted),
            )),
        ]),
        None => Paragraph::new("No favorite selected"),
    };
    frame.render_widget(
        detail
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn render_banner(frame: &mut Frame, area: Rect, app: &App) {
    let Some(banner) = app.notifier.visible() else {
        return;
    };
    let width = area.width.min(50);
    let banner_area = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: area.height.min(3),
    };
    frame.render_widget(Clear, banner_area);
    let widget = Paragraph::new(banner.message.as_str())
        .style(Style::default().bg(banner.level.color()).fg(Color::White))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, banner_area);
}

fn render_guide_bar(frame: &mut Frame, area: Rect, app: &App, colors: Palette) {
    let spans: Vec<Span> = get_key_hints(app)
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!(" [{key}] "),
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .fg(colors.accent),
                ),
                Span::raw(format!("{desc}  ")),
            ]
        })
        .collect();

    let guide =
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Guide"));
    frame.render_widget(guide, area);
}

fn get_key_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    if app.input_mode == InputMode::Search {
        return vec![("Enter", "Keep"), ("Esc", "Clear")];
    }
    if app.modal.is_open() {
        return vec![("f", "Favorite"), ("r", "Random"), ("v", "Favorites"), ("Esc", "Close")];
    }
    if app.show_help {
        return vec![("?", "Close Help")];
    }

    let mut hints = vec![("q", "Quit"), ("?", "Help"), ("Tab", "Switch")];
    match app.tab {
        Tab::Explore => hints.extend_from_slice(&[
            ("/", "Search"),
            ("c", "Category"),
            ("d", "Difficulty"),
            ("←/→", "Page"),
            ("Enter", "Detail"),
            ("f", "Favorite"),
            ("r", "Random"),
        ]),
        Tab::Favorites => hints.extend_from_slice(&[("↑/↓", "Nav"), ("Enter", "Detail"), ("x", "Remove")]),
    }
    hints
}

fn render_help_popup(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default().borders(Borders::ALL).title("Help");
    let help = Paragraph::new(HELP_TEXT).block(block).wrap(Wrap { trim: true });
    frame.render_widget(help, popup_area);
}

const HELP_TEXT: &str = "/: search titles and descriptions\n\
c: next category\n\
d: next difficulty\n\
x: clear filters\n\
left/right, n/p: change page\n\
enter: project detail\n\
f: toggle favorite\n\
r, ctrl+r: random project\n\
t: toggle theme\n\
tab: explore/favorites\n\
q: quit";

fn modal_rect(area: Rect) -> Rect {
    centered_rect(70, 70, area)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn restore_terminal(mut terminal: Terminal<ratatui::backend::CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
