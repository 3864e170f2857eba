use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::runtime::Runtime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ic_client::HttpCatalog;
use ic_core::{CatalogFilters, CatalogSource, Difficulty, Project, Theme};
use ic_engine::{load_catalog_vocabularies, PageView, PaginationControls, ProjectCard, ViewState};
use ic_store::{
    config_path, load_config, resolve_api_url, resolve_data_dir, save_config, ClientConfig,
    FavoriteChange, FavoritesStore, FsStore, Preferences,
};
use ic_utils::{capitalize, results_count_label};

const LOG_FILE_NAME: &str = "inspicode.log";

#[derive(Parser)]
#[command(name = "inspicode", version, about = "Browse project ideas from the InspiCode catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List projects, filtered and paginated.
    Projects {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        difficulty: Option<DifficultyArg>,
        /// Free-text search on title and description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show a random project.
    Random {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        difficulty: Option<DifficultyArg>,
    },
    /// Show catalog totals.
    Stats,
    /// List the available categories and difficulties.
    Filters,
    /// List saved favorites.
    Favorites,
    /// Add or remove a favorite by exact project title.
    Favorite { title: String },
    /// Show or set the theme used by the interactive browser.
    Theme {
        #[arg(value_enum)]
        theme: Option<ThemeArg>,
    },
    /// Show or update the client configuration.
    Config {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        data_dir: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config().context("failed to load config")?;

    let command = match cli.command {
        Some(c) => c,
        None => return run_tui(&config),
    };
    init_stderr_logging()?;

    let store = || resolve_data_dir(&config).map(FsStore::new);
    match command {
        Command::Projects {
            category,
            difficulty,
            search,
            page,
        } => {
            let filters = CatalogFilters::new(category, difficulty.map(Into::into), search);
            list_projects(&catalog(&config)?, &FavoritesStore::new(store()?), filters, page)
        }
        Command::Random {
            category,
            difficulty,
        } => {
            let filters = CatalogFilters::new(category, difficulty.map(Into::into), None);
            random_project(&catalog(&config)?, &filters)
        }
        Command::Stats => show_stats(&catalog(&config)?),
        Command::Filters => show_filters(&catalog(&config)?),
        Command::Favorites => list_favorites(&FavoritesStore::new(store()?)),
        Command::Favorite { title } => {
            toggle_favorite(&catalog(&config)?, &FavoritesStore::new(store()?), &title)
        }
        Command::Theme { theme } => {
            theme_command(&Preferences::new(store()?), theme.map(Into::into))
        }
        Command::Config { api_url, data_dir } => configure(&config, api_url, data_dir),
    }
}

fn run_tui(config: &ClientConfig) -> Result<()> {
    let data_dir = resolve_data_dir(config)?;
    init_file_logging(&data_dir)?;
    ic_tui::run(ic_tui::TuiOptions {
        api_url: resolve_api_url(config),
        data_dir,
    })
}

fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn init_file_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE_NAME))
        .context("failed to open log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn catalog(config: &ClientConfig) -> Result<HttpCatalog> {
    let api_url = resolve_api_url(config);
    debug!(%api_url, "using catalog backend");
    HttpCatalog::new(&api_url).context("invalid api url")
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize runtime")
}

fn list_projects(
    catalog: &HttpCatalog,
    favorites: &FavoritesStore<FsStore>,
    filters: CatalogFilters,
    page: usize,
) -> Result<()> {
    let mut view = ViewState::new();
    let request = view.issue_request(filters);
    let projects = runtime()?
        .block_on(catalog.projects(&request.filters))
        .context("failed to load projects")?;
    view.complete_request(request.token, Ok(projects));
    view.set_page(page);

    println!("{}", results_count_label(view.filtered_projects().len()));
    match view.render_page(&favorites.list()) {
        PageView::Cards(cards) => {
            for card in &cards {
                println!("{}", format_card(card));
            }
        }
        PageView::Empty(empty) => {
            println!("{}", empty.heading);
            println!("{}", empty.hint);
        }
    }
    if let Some(controls) = view.pagination_controls() {
        println!("{}", format_pagination(&controls, view.current_page()));
    }
    Ok(())
}

fn random_project(catalog: &HttpCatalog, filters: &CatalogFilters) -> Result<()> {
    let project = runtime()?
        .block_on(catalog.random(filters))
        .context("failed to fetch a random project")?;
    println!("{}", format_detail(&project));
    Ok(())
}

fn show_stats(catalog: &HttpCatalog) -> Result<()> {
    let stats = runtime()?
        .block_on(catalog.stats())
        .context("failed to load stats")?;
    println!("Projects:\t{}", stats.total_projects);
    println!("Categories:\t{}", stats.categories);
    println!("Difficulties:\t{}", stats.difficulties);
    Ok(())
}

fn show_filters(catalog: &HttpCatalog) -> Result<()> {
    let vocab = runtime()?.block_on(load_catalog_vocabularies(catalog));
    println!("Categories:\t{}", vocab.categories.join(", "));
    let difficulties: Vec<String> = vocab.difficulties.iter().map(|d| capitalize(d)).collect();
    println!("Difficulties:\t{}", difficulties.join(", "));
    Ok(())
}

fn list_favorites(favorites: &FavoritesStore<FsStore>) -> Result<()> {
    for favorite in favorites.list() {
        println!(
            "{}\t{}\t{}\t{}",
            favorite.title,
            favorite.category,
            capitalize(favorite.difficulty.as_str()),
            favorite.added_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn toggle_favorite(
    catalog: &HttpCatalog,
    favorites: &FavoritesStore<FsStore>,
    title: &str,
) -> Result<()> {
    let project = match favorites.list().into_iter().find(|f| f.title == title) {
        Some(favorite) => favorite.to_project(),
        None => {
            let filters = CatalogFilters::new(None, None, Some(title.to_string()));
            let candidates = runtime()?
                .block_on(catalog.projects(&filters))
                .context("failed to load projects")?;
            find_by_title(candidates, title)
                .ok_or_else(|| anyhow!("no project titled {title:?}"))?
        }
    };

    let outcome = favorites.toggle(&project, Utc::now());
    if !outcome.persisted {
        bail!("could not save favorites");
    }
    info!(title = %project.title, change = ?outcome.change, "favorite updated");
    match outcome.change {
        FavoriteChange::Added => println!("⭐ Project added to favorites!"),
        FavoriteChange::Removed => println!("💔 Project removed from favorites"),
    }
    Ok(())
}

fn find_by_title(projects: Vec<Project>, title: &str) -> Option<Project> {
    projects.into_iter().find(|project| project.title == title)
}

fn theme_command(preferences: &Preferences<FsStore>, theme: Option<Theme>) -> Result<()> {
    match theme {
        None => println!("{}", preferences.theme().as_str()),
        Some(theme) => {
            preferences
                .set_theme(theme)
                .context("failed to save theme")?;
            match theme {
                Theme::Dark => println!("Dark mode enabled"),
                Theme::Light => println!("Light mode enabled"),
            }
        }
    }
    Ok(())
}

fn configure(
    current: &ClientConfig,
    api_url: Option<String>,
    data_dir: Option<String>,
) -> Result<()> {
    let path = config_path()?;
    if api_url.is_none() && data_dir.is_none() {
        println!("config:\t{}", path.display());
        println!("api_url:\t{}", resolve_api_url(current));
        println!("data_dir:\t{}", resolve_data_dir(current)?.display());
        return Ok(());
    }

    let mut config = current.clone();
    if let Some(api_url) = api_url {
        HttpCatalog::new(&api_url).context("invalid api url")?;
        config.api_url = Some(api_url);
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = Some(data_dir);
    }
    save_config(&config).context("failed to save config")?;
    println!("Config saved to {}", path.display());
    Ok(())
}

fn format_card(card: &ProjectCard) -> String {
    let star = if card.favorite { '★' } else { '☆' };
    format!(
        "{star} {}  [{} · {}]\n    {}",
        card.title,
        card.category,
        capitalize(card.difficulty.as_str()),
        card.excerpt
    )
}

fn format_pagination(controls: &PaginationControls, current: usize) -> String {
    let mut parts = Vec::new();
    if controls.previous.is_some() {
        parts.push("← Prev".to_string());
    }
    let pages: Vec<String> = controls
        .pages
        .iter()
        .map(|page| {
            if page.active {
                format!("[{}]", page.number)
            } else {
                page.number.to_string()
            }
        })
        .collect();
    parts.push(pages.join(" "));
    if controls.next.is_some() {
        parts.push("Next →".to_string());
    }
    parts.push(format!("Page {current}/{}", controls.total));
    parts.join("  ")
}

fn format_detail(project: &Project) -> String {
    format!(
        "{}\n{} · {}\n\n{}",
        project.title,
        project.category,
        capitalize(project.difficulty.as_str()),
        project.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn project(title: &str) -> Project {
        Project {
            title: title.into(),
            description: "Keep score across rounds.".into(),
            category: "Games".into(),
            difficulty: Difficulty::Medium,
        }
    }

    fn paged_view(count: usize, page: usize) -> ViewState {
        let mut view = ViewState::new();
        let request = view.issue_request(CatalogFilters::default());
        let projects = (0..count).map(|i| project(&format!("Idea {i}"))).collect();
        view.complete_request(request.token, Ok(projects));
        view.set_page(page);
        view
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn projects_arguments_parse() {
        let cli = Cli::try_parse_from([
            "inspicode",
            "projects",
            "--category",
            "Web",
            "--difficulty",
            "hard",
            "--page",
            "2",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::Projects {
                category,
                difficulty,
                search,
                page,
            }) => {
                let filters = CatalogFilters::new(category, difficulty.map(Into::into), search);
                assert_eq!(filters.category.as_deref(), Some("Web"));
                assert_eq!(filters.difficulty, Some(Difficulty::Hard));
                assert_eq!(filters.search, None);
                assert_eq!(page, 2);
            }
            _ => panic!("expected projects command"),
        }
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        assert!(Cli::try_parse_from(["inspicode", "random", "--difficulty", "extreme"]).is_err());
    }

    #[test]
    fn no_subcommand_launches_the_browser() {
        let cli = Cli::try_parse_from(["inspicode"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn pagination_line_marks_current_page() {
        let view = paged_view(30, 2);
        let controls = view.pagination_controls().expect("controls");
        insta::assert_snapshot!(
            format_pagination(&controls, view.current_page()),
            @"← Prev  1 [2] 3  Next →  Page 2/3"
        );
    }

    #[test]
    fn first_page_has_no_previous_control() {
        let view = paged_view(13, 1);
        let controls = view.pagination_controls().expect("controls");
        insta::assert_snapshot!(
            format_pagination(&controls, view.current_page()),
            @"[1] 2  Next →  Page 1/2"
        );
    }

    #[test]
    fn card_shows_star_tags_and_excerpt() {
        let card = ProjectCard {
            title: "Chess Engine".into(),
            category: "Games".into(),
            difficulty: Difficulty::Hard,
            excerpt: "Search moves with alpha-beta.".into(),
            favorite: true,
        };
        assert_eq!(
            format_card(&card),
            "★ Chess Engine  [Games · Hard]\n    Search moves with alpha-beta."
        );
    }

    #[test]
    fn favorite_lookup_needs_an_exact_title() {
        let candidates = vec![project("Snake Game"), project("Snake Game Deluxe")];
        assert_eq!(
            find_by_title(candidates.clone(), "Snake Game").map(|p| p.title),
            Some("Snake Game".to_string())
        );
        assert!(find_by_title(candidates, "snake game").is_none());
    }
}
