//! Catalog loading, local search, and pagination for InspiCode.
//!
//! [`ViewState`] owns the loaded catalog and the derived page. Rendering
//! is a pure function of that state: [`ViewState::render_page`] and
//! [`ViewState::pagination_controls`] return view models that the
//! presenters draw.

use std::collections::HashSet;

use tracing::{debug, error, info};

use ic_core::{CatalogFilters, CatalogSource, CoreResult, Difficulty, Favorite, Project, Vocabularies};
use ic_utils::{excerpt, EXCERPT_LEN};

/// Number of cards per page.
pub const PAGE_SIZE: usize = 12;

/// Page buttons shown on each side of the current page.
const PAGE_RADIUS: usize = 2;

/// Identifies one issued project request. Later requests compare greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A project fetch the caller should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRequest {
    /// Token to hand back with the response.
    pub token: RequestToken,
    /// Server-side filters to send.
    pub filters: CatalogFilters,
}

/// What happened when a project response was handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the catalog.
    Applied {
        /// Number of projects loaded.
        count: usize,
    },
    /// A newer request was issued; the response was dropped.
    Stale,
    /// The fetch failed; the previous catalog is kept.
    Failed,
}

/// One rendered project card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCard {
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Description cut to the card length.
    pub excerpt: String,
    pub favorite: bool,
}

/// Placeholder shown when a page has no cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub heading: &'static str,
    pub hint: &'static str,
    /// Label of the clear-filters action.
    pub action: &'static str,
}

/// The placeholder used by every empty page.
pub const EMPTY_STATE: EmptyState = EmptyState {
    heading: "No projects found",
    hint: "Try adjusting your filters",
    action: "Clear filters",
};

/// Rendered content of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Cards(Vec<ProjectCard>),
    Empty(EmptyState),
}

/// A numbered page button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageButton {
    pub number: usize,
    pub active: bool,
}

/// Pagination controls for the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControls {
    /// Target of the Previous control, when there is one.
    pub previous: Option<usize>,
    /// Windowed page buttons around the current page.
    pub pages: Vec<PageButton>,
    /// Target of the Next control, when there is one.
    pub next: Option<usize>,
    pub total: usize,
}

/// Loaded catalog, local search, and current page.
#[derive(Debug, Clone)]
pub struct ViewState {
    all_projects: Vec<Project>,
    filtered_projects: Vec<Project>,
    current_page: usize,
    search_term: String,
    filters: CatalogFilters,
    pending: CatalogFilters,
    latest: RequestToken,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    /// Empty state on page 1.
    pub fn new() -> Self {
        Self {
            all_projects: Vec::new(),
            filtered_projects: Vec::new(),
            current_page: 1,
            search_term: String::new(),
            filters: CatalogFilters::default(),
            pending: CatalogFilters::default(),
            latest: RequestToken::default(),
        }
    }

    /// Every project from the latest applied response.
    pub fn all_projects(&self) -> &[Project] {
        &self.all_projects
    }

    /// Projects left after the local search.
    pub fn filtered_projects(&self) -> &[Project] {
        &self.filtered_projects
    }

    /// Current 1-based page.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Active local search term.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Filters of the catalog currently loaded.
    pub fn filters(&self) -> &CatalogFilters {
        &self.filters
    }

    /// Start a project fetch. Responses to earlier requests become stale.
    pub fn issue_request(&mut self, filters: CatalogFilters) -> ProjectRequest {
        self.latest = self.latest.next();
        self.pending = filters.clone();
        ProjectRequest {
            token: self.latest,
            filters,
        }
    }

    /// Hand back the response for a request.
    ///
    /// Only the latest request is applied; it replaces the catalog,
    /// re-runs the local search, and returns to page 1.
    pub fn complete_request(
        &mut self,
        token: RequestToken,
        result: CoreResult<Vec<Project>>,
    ) -> LoadOutcome {
        if token != self.latest {
            debug!(?token, latest = ?self.latest, "dropping stale project response");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(projects) => {
                let count = projects.len();
                self.all_projects = projects;
                self.filters = self.pending.clone();
                let term = self.search_term.clone();
                self.apply_local_search(&term);
                info!(count, "projects loaded");
                LoadOutcome::Applied { count }
            }
            Err(err) => {
                error!(error = %err, "failed to load projects");
                LoadOutcome::Failed
            }
        }
    }

    /// Narrow the loaded catalog to projects whose title or description
    /// contains `term`, ignoring case. A blank term keeps everything.
    pub fn apply_local_search(&mut self, term: &str) {
        self.search_term = term.trim().to_string();
        let needle = self.search_term.to_lowercase();
        self.filtered_projects = if needle.is_empty() {
            self.all_projects.clone()
        } else {
            self.all_projects
                .iter()
                .filter(|project| project.mentions(&needle))
                .cloned()
                .collect()
        };
        self.current_page = 1;
    }

    /// Reset the search and structured filters and request a reload.
    pub fn clear_filters(&mut self) -> ProjectRequest {
        self.search_term.clear();
        self.issue_request(CatalogFilters::default())
    }

    /// Number of pages, `ceil(filtered / PAGE_SIZE)`.
    pub fn total_pages(&self) -> usize {
        self.filtered_projects.len().div_ceil(PAGE_SIZE)
    }

    /// Move to a page, clamped to `[1, total_pages]`.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    /// Projects on the current page.
    pub fn page_slice(&self) -> &[Project] {
        let start = (self.current_page - 1) * PAGE_SIZE;
        if start >= self.filtered_projects.len() {
            return &[];
        }
        let end = (start + PAGE_SIZE).min(self.filtered_projects.len());
        &self.filtered_projects[start..end]
    }

    /// Cards for the current page, or the empty-state placeholder.
    pub fn render_page(&self, favorites: &[Favorite]) -> PageView {
        let slice = self.page_slice();
        if slice.is_empty() {
            return PageView::Empty(EMPTY_STATE);
        }
        let favorite_titles: HashSet<&str> =
            favorites.iter().map(|favorite| favorite.title.as_str()).collect();
        PageView::Cards(
            slice
                .iter()
                .map(|project| ProjectCard {
                    title: project.title.clone(),
                    category: project.category.clone(),
                    difficulty: project.difficulty,
                    excerpt: excerpt(&project.description, EXCERPT_LEN),
                    favorite: favorite_titles.contains(project.title.as_str()),
                })
                .collect(),
        )
    }

    /// Page buttons for the current page; `None` with one page or less.
    pub fn pagination_controls(&self) -> Option<PaginationControls> {
        let total = self.total_pages();
        if total <= 1 {
            return None;
        }
        let current = self.current_page;
        let first = current.saturating_sub(PAGE_RADIUS).max(1);
        let last = (current + PAGE_RADIUS).min(total);
        Some(PaginationControls {
            previous: (current > 1).then(|| current - 1),
            pages: (first..=last)
                .map(|number| PageButton {
                    number,
                    active: number == current,
                })
                .collect(),
            next: (current < total).then(|| current + 1),
            total,
        })
    }
}

/// Fetch both filter vocabularies concurrently.
///
/// Either failure is logged and yields empty vocabularies.
pub async fn load_catalog_vocabularies<S: CatalogSource + ?Sized>(source: &S) -> Vocabularies {
    let (categories, difficulties) = tokio::join!(source.categories(), source.difficulties());
    match (categories, difficulties) {
        (Ok(categories), Ok(difficulties)) => Vocabularies {
            categories,
            difficulties,
        },
        (Err(err), _) | (_, Err(err)) => {
            error!(error = %err, "failed to load filter vocabularies");
            Vocabularies::default()
        }
    }
}

/// Issue, fetch, and apply one project request.
pub async fn load_projects<S: CatalogSource + ?Sized>(
    state: &mut ViewState,
    source: &S,
    filters: CatalogFilters,
) -> LoadOutcome {
    let request = state.issue_request(filters);
    let result = source.projects(&request.filters).await;
    state.complete_request(request.token, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use ic_core::{CoreError, Stats};

    struct FixtureCatalog {
        projects: Vec<Project>,
        offline: bool,
    }

    impl FixtureCatalog {
        fn new() -> Self {
            Self {
                projects: fixture(),
                offline: false,
            }
        }

        fn offline() -> Self {
            Self {
                projects: Vec::new(),
                offline: true,
            }
        }

        fn check(&self) -> CoreResult<()> {
            if self.offline {
                return Err(CoreError::Network("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CatalogSource for FixtureCatalog {
        async fn categories(&self) -> CoreResult<Vec<String>> {
            self.check()?;
            let mut categories: Vec<_> = self
                .projects
                .iter()
                .map(|project| project.category.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            categories.sort();
            Ok(categories)
        }

        async fn difficulties(&self) -> CoreResult<Vec<String>> {
            self.check()?;
            Ok(Difficulty::ALL.iter().map(|d| d.as_str().to_string()).collect())
        }

        async fn projects(&self, filters: &CatalogFilters) -> CoreResult<Vec<Project>> {
            self.check()?;
            Ok(self
                .projects
                .iter()
                .filter(|project| filters.matches(project))
                .cloned()
                .collect())
        }

        async fn random(&self, filters: &CatalogFilters) -> CoreResult<Project> {
            self.projects(filters)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::Api {
                    status: 404,
                    detail: "No project found".into(),
                })
        }

        async fn stats(&self) -> CoreResult<Stats> {
            self.check()?;
            Ok(Stats::default())
        }
    }

    fn fixture() -> Vec<Project> {
        serde_json::from_str(include_str!("../tests/fixtures/projects.json")).expect("fixture")
    }

    fn synthetic(count: usize) -> Vec<Project> {
        (0..count)
            .map(|index| Project {
                title: format!("Project {index}"),
                description: format!("Description {index}"),
                category: "Tools".into(),
                difficulty: Difficulty::Easy,
            })
            .collect()
    }

    fn loaded(projects: Vec<Project>) -> ViewState {
        let mut state = ViewState::new();
        let request = state.issue_request(CatalogFilters::default());
        state.complete_request(request.token, Ok(projects));
        state
    }

    fn favorite(title: &str) -> Favorite {
        let project = fixture()
            .into_iter()
            .find(|project| project.title == title)
            .expect("fixture title");
        Favorite::from_project(&project, Utc::now())
    }

    #[tokio::test]
    async fn initial_load_pages_the_whole_catalog() {
        let catalog = FixtureCatalog::new();
        let mut state = ViewState::new();

        let outcome = load_projects(&mut state, &catalog, CatalogFilters::default()).await;

        assert_eq!(outcome, LoadOutcome::Applied { count: 30 });
        assert_eq!(state.filtered_projects().len(), 30);
        assert_eq!(state.total_pages(), 3);
        assert_eq!(state.page_slice(), &state.filtered_projects()[0..12]);

        state.set_page(3);
        assert_eq!(state.page_slice().len(), 6);
    }

    #[tokio::test]
    async fn structured_filters_go_to_the_source() {
        let catalog = FixtureCatalog::new();
        let mut state = ViewState::new();
        let filters = CatalogFilters::new(Some("Web".into()), Some(Difficulty::Hard), None);

        load_projects(&mut state, &catalog, filters.clone()).await;

        assert_eq!(state.filters(), &filters);
        let titles: Vec<_> = state.all_projects().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Multiplayer Quiz", "Chat App"]);
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_applied_filters() {
        let mut state = ViewState::new();
        let web = CatalogFilters::new(Some("Web".into()), None, None);
        load_projects(&mut state, &FixtureCatalog::new(), web.clone()).await;
        let loaded = state.all_projects().len();

        let games = CatalogFilters::new(Some("Games".into()), None, None);
        let outcome = load_projects(&mut state, &FixtureCatalog::offline(), games).await;

        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(state.filters(), &web);
        assert_eq!(state.all_projects().len(), loaded);
    }

    #[test]
    fn local_search_partitions_the_catalog() {
        let mut state = loaded(fixture());
        state.set_page(2);
        state.apply_local_search("GaMe");

        assert_eq!(state.current_page(), 1);
        let titles: Vec<_> = state
            .filtered_projects()
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(
            titles,
            ["Tetris Clone", "Snake Game", "Chess Engine", "Multiplayer Quiz"]
        );
        for project in state.all_projects() {
            let kept = state.filtered_projects().contains(project);
            assert_eq!(kept, project.mentions("game"), "{}", project.title);
        }
    }

    #[test]
    fn blank_search_restores_everything() {
        let mut state = loaded(fixture());
        state.apply_local_search("chess");
        assert_eq!(state.filtered_projects().len(), 1);

        state.apply_local_search("   ");
        assert_eq!(state.filtered_projects(), state.all_projects());
        assert_eq!(state.search_term(), "");
    }

    #[test]
    fn search_without_matches_renders_the_empty_state() {
        let mut state = loaded(fixture());
        state.apply_local_search("quantum");

        assert_eq!(state.render_page(&[]), PageView::Empty(EMPTY_STATE));
        assert_eq!(state.pagination_controls(), None);
        assert_eq!(state.total_pages(), 0);
    }

    #[test]
    fn reload_keeps_the_local_search() {
        let mut state = loaded(synthetic(5));
        state.apply_local_search("tetris");
        assert!(state.filtered_projects().is_empty());

        let request = state.issue_request(CatalogFilters::default());
        state.complete_request(request.token, Ok(fixture()));
        assert_eq!(state.filtered_projects().len(), 1);
        assert_eq!(state.filtered_projects()[0].title, "Tetris Clone");
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut state = ViewState::new();
        let first = state.issue_request(CatalogFilters::default());
        let second = state.issue_request(CatalogFilters::new(Some("Web".into()), None, None));
        assert!(second.token > first.token);

        let web: Vec<_> = fixture().into_iter().filter(|p| p.category == "Web").collect();
        assert_eq!(
            state.complete_request(second.token, Ok(web.clone())),
            LoadOutcome::Applied { count: web.len() }
        );
        assert_eq!(
            state.complete_request(first.token, Ok(fixture())),
            LoadOutcome::Stale
        );
        assert_eq!(state.all_projects(), web.as_slice());
    }

    #[test]
    fn failed_reload_keeps_previous_catalog() {
        let mut state = loaded(fixture());
        state.set_page(2);

        let request = state.issue_request(CatalogFilters::default());
        let outcome = state.complete_request(
            request.token,
            Err(CoreError::Network("connection reset".into())),
        );

        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(state.all_projects().len(), 30);
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn page_index_is_clamped() {
        let mut state = loaded(fixture());
        state.set_page(99);
        assert_eq!(state.current_page(), 3);
        state.next_page();
        assert_eq!(state.current_page(), 3);
        state.set_page(0);
        assert_eq!(state.current_page(), 1);
        state.previous_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        for (count, last_len) in [(12, 12), (13, 1), (24, 12), (25, 1)] {
            let mut state = loaded(synthetic(count));
            assert_eq!(state.total_pages(), count.div_ceil(PAGE_SIZE));
            state.set_page(usize::MAX);
            assert_eq!(state.page_slice().len(), last_len, "count {count}");
        }
    }

    #[test]
    fn pagination_windows_around_the_current_page() {
        let mut state = loaded(synthetic(100));
        let numbers = |controls: &PaginationControls| -> Vec<usize> {
            controls.pages.iter().map(|page| page.number).collect()
        };

        let first = state.pagination_controls().expect("controls");
        assert_eq!(first.total, 9);
        assert_eq!(first.previous, None);
        assert_eq!(numbers(&first), [1, 2, 3]);
        assert_eq!(first.next, Some(2));

        state.set_page(5);
        let middle = state.pagination_controls().expect("controls");
        assert_eq!(numbers(&middle), [3, 4, 5, 6, 7]);
        assert_eq!((middle.previous, middle.next), (Some(4), Some(6)));
        assert!(middle.pages.iter().any(|page| page.number == 5 && page.active));

        state.set_page(9);
        let last = state.pagination_controls().expect("controls");
        assert_eq!(numbers(&last), [7, 8, 9]);
        assert_eq!(last.next, None);
    }

    #[test]
    fn single_page_has_no_controls() {
        assert_eq!(loaded(synthetic(12)).pagination_controls(), None);
        assert_eq!(loaded(Vec::new()).pagination_controls(), None);
    }

    #[test]
    fn cards_mark_favorites_and_truncate_descriptions() {
        let mut long = synthetic(1);
        long[0].description = "x".repeat(150);
        let state = loaded(long);
        let PageView::Cards(cards) = state.render_page(&[]) else {
            panic!("expected cards");
        };
        assert!(cards[0].excerpt.ends_with('…'));
        assert!(!cards[0].favorite);

        let mut state = loaded(fixture());
        state.apply_local_search("tetris");
        let PageView::Cards(cards) = state.render_page(&[favorite("Tetris Clone")]) else {
            panic!("expected cards");
        };
        assert!(cards[0].favorite);
    }

    #[test]
    fn clear_filters_resets_search_and_filters() {
        let mut state = ViewState::new();
        state.issue_request(CatalogFilters::new(Some("Web".into()), None, None));
        state.apply_local_search("chat");

        let request = state.clear_filters();
        assert!(request.filters.is_empty());
        assert_eq!(state.search_term(), "");
    }

    #[tokio::test]
    async fn vocabularies_load_or_stay_empty() {
        let vocab = load_catalog_vocabularies(&FixtureCatalog::new()).await;
        assert_eq!(vocab.categories.len(), 6);
        assert_eq!(vocab.difficulties, ["easy", "medium", "hard"]);

        let offline = load_catalog_vocabularies(&FixtureCatalog::offline()).await;
        assert_eq!(offline, Vocabularies::default());
    }

    #[tokio::test]
    async fn offline_source_fails_without_touching_state() {
        let mut state = loaded(fixture());
        let outcome =
            load_projects(&mut state, &FixtureCatalog::offline(), CatalogFilters::default()).await;
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(state.filtered_projects().len(), 30);
    }
}
