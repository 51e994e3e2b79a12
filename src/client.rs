//! Top-level portal client
//!
//! `SigaaClient` owns one session, one document client and the stores of
//! one institution. Every data method checks the session before touching
//! the network.

use crate::browser::{DocumentClient, Fetcher, HttpFetcher};
use crate::config::Config;
use crate::extract::{read_account, read_activities, read_campuses, read_course, read_departments, read_teacher_email, read_teacher_results};
use crate::models::{
    Account, ActiveSection, Activity, Campus, DetailedProgram, DetailedSection, Record, RequestedCourse,
    TeacherResult,
};
use crate::navigator::{
    ActiveSectionTraversal, CategorySelection, FormStep, Navigator, ProgramTraversal, SectionTraversal,
    TraversalReport,
};
use crate::portal::PortalProfile;
use crate::session::{self, Session};
use crate::storage::{EphemeralCache, RecordStorage, SqliteRecordStore, StorageError, Stores, UpsertTally};
use crate::{ConfigError, Result, SigaaError};
use std::path::{Path, PathBuf};
use url::Url;

/// Result of a crawl command
#[derive(Debug, Clone)]
pub struct CrawlOutcome<R> {
    pub report: TraversalReport<R>,
    /// What persisting the records did
    pub stored: UpsertTally,
    /// True when the records came from a previously completed crawl
    pub from_store: bool,
}

impl<R> Default for CrawlOutcome<R> {
    fn default() -> Self {
        Self {
            report: TraversalReport::default(),
            stored: UpsertTally::default(),
            from_store: false,
        }
    }
}

pub struct SigaaClient<F> {
    config: Config,
    profile: PortalProfile,
    session: Session,
    doc: DocumentClient<F>,
    stores: Stores,
    active_sections: Option<Vec<ActiveSection>>,
}

impl SigaaClient<HttpFetcher> {
    /// Builds an HTTP-backed client and opens the institution's stores
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.transport)?;
        let stores = Stores::open(Path::new(&config.storage.data_dir), &config.portal.institution)?;
        Self::new(config, fetcher, stores)
    }
}

impl<F: Fetcher> SigaaClient<F> {
    pub fn new(config: Config, fetcher: F, stores: Stores) -> Result<Self> {
        let profile = PortalProfile::for_institution(&config.portal.institution)
            .ok_or_else(|| SigaaError::UnsupportedInstitution(config.portal.institution.clone()))?;

        let base = config.portal.base_url.as_deref().unwrap_or(profile.host);
        let base = Url::parse(base).map_err(|_| ConfigError::InvalidUrl(base.to_string()))?;

        Ok(Self {
            session: Session::new(profile.key),
            doc: DocumentClient::new(fetcher, base, config.transport.history_limit),
            profile,
            stores,
            config,
            active_sections: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &PortalProfile {
        &self.profile
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn requests_issued(&self) -> usize {
        self.doc.requests_issued()
    }

    /// Logs in with the configured credentials
    pub async fn login(&mut self) -> Result<()> {
        let username = self
            .config
            .credentials
            .username
            .clone()
            .ok_or_else(|| ConfigError::Missing("credentials.username".to_string()))?;
        let password = self
            .config
            .credentials
            .password
            .clone()
            .ok_or_else(|| ConfigError::Missing("credentials.password".to_string()))?;

        self.login_with(&username, &password).await
    }

    pub async fn login_with(&mut self, username: &str, password: &str) -> Result<()> {
        session::login(&mut self.session, &mut self.doc, &self.profile.auth, username, password).await
    }

    /// Ends the portal session and drops memoized data
    pub async fn logoff(&mut self) -> Result<()> {
        self.active_sections = None;
        session::logoff(&mut self.session, &mut self.doc, &self.profile.auth).await
    }

    /// Reads the student account from the portal home and stores it
    pub async fn get_account(&mut self) -> Result<Account> {
        self.session.require_authenticated()?;

        let home = &self.profile.home;
        self.doc.navigate(home.path).await?;
        let url = self.current_url();

        if self.doc.content().contains(home.unexpected_marker) {
            tracing::warn!("Portal home reported an unexpected error");
            return Err(self.missing(home.registration));
        }

        let account = {
            let page = self.doc.page();
            read_account(&page, home, self.profile.key, &url)
        };
        let account = account.ok_or_else(|| self.missing(home.registration))?;

        let outcome = self.stores.records.upsert(&account)?;
        tracing::debug!("Account {}: {}", account.registration, outcome.to_db_string());
        Ok(account)
    }

    /// Sections the student is enrolled in, memoized until logoff
    pub async fn get_active_sections(&mut self) -> Result<Vec<ActiveSection>> {
        self.session.require_authenticated()?;

        if let Some(sections) = &self.active_sections {
            tracing::debug!("Using {} memoized active sections", sections.len());
            return Ok(sections.clone());
        }

        let traversal = ActiveSectionTraversal::new(&self.profile.active, self.profile.home.path);
        let report = Navigator::new(&mut self.doc).traverse(&traversal).await?;
        if report.degraded > 0 {
            tracing::warn!(
                "{} active sections captured without their participants page",
                report.degraded
            );
        }

        self.active_sections = Some(report.records.clone());
        Ok(report.records)
    }

    /// Upcoming activities listed on the portal home
    pub async fn get_activities(&mut self) -> Result<Vec<Activity>> {
        self.session.require_authenticated()?;

        self.doc.navigate(self.profile.home.path).await?;
        let page = self.doc.page();
        if !page.has(self.profile.activities.container) {
            tracing::debug!("No activity table on the portal home");
            return Ok(Vec::new());
        }
        Ok(read_activities(&page, &self.profile.activities))
    }

    /// Undergraduate programs with their curricula
    ///
    /// Once a full crawl has completed, stored programs are returned without
    /// any request unless `refresh` is set.
    pub async fn get_programs(&mut self, refresh: bool) -> Result<CrawlOutcome<DetailedProgram>> {
        self.session.require_authenticated()?;

        if let Some(outcome) = self.stored_crawl(refresh)? {
            return Ok(outcome);
        }

        let known = if refresh { Vec::new() } else { self.stores.records.all()? };
        let traversal = ProgramTraversal::new(&self.profile.programs, known);
        let report = Navigator::new(&mut self.doc).traverse(&traversal).await?;

        let stored = persist(&mut self.stores.records, &report.records)?;
        let outcome = CrawlOutcome {
            report,
            stored,
            from_store: false,
        };
        self.finish_crawl(&outcome, false)?;
        Ok(outcome)
    }

    /// Sections of every department (or the configured ones)
    ///
    /// Records are stored after each department, so an interrupted crawl
    /// resumes without revisiting captured sections. The completion marker
    /// is only written by an unfiltered crawl in which no department was
    /// skipped. A crawl limited by `crawl.departments` always visits the
    /// listings, reusing stored sections row by row, since stored records
    /// do not say which department they came from.
    pub async fn get_sections(&mut self, refresh: bool) -> Result<CrawlOutcome<DetailedSection>> {
        self.session.require_authenticated()?;

        let filtered = !self.config.crawl.departments.is_empty();
        if let Some(outcome) = self.stored_crawl(refresh || filtered)? {
            return Ok(outcome);
        }

        let categories = self.section_categories().await?;
        let known = if refresh { Vec::new() } else { self.stores.records.all()? };
        let traversal = SectionTraversal::new(&self.profile.sections, known);

        let mut outcome = CrawlOutcome::default();
        for category in &categories {
            let part = Navigator::new(&mut self.doc)
                .traverse_categories(std::slice::from_ref(category), &traversal)
                .await?;
            outcome.stored.merge(persist(&mut self.stores.records, &part.records)?);
            outcome.report.merge(part);
        }

        self.finish_crawl(&outcome, filtered)?;
        Ok(outcome)
    }

    /// Looks up a component by reference id
    ///
    /// Answers from the TTL cache when possible; fresh lookups are cached
    /// and upserted into the durable store.
    pub async fn get_course(&mut self, id_ref: &str) -> Result<RequestedCourse> {
        self.session.require_authenticated()?;

        let key = format!("course:{}", id_ref);
        if let Some(course) = self.stores.cache.get::<RequestedCourse>(&key)? {
            tracing::debug!("Course {} served from cache", id_ref);
            return Ok(course);
        }

        let courses = &self.profile.courses;
        self.doc.navigate(&courses.detail_path_for(id_ref)).await?;

        let course = {
            let page = self.doc.page();
            if !page.has(courses.detail_container) {
                None
            } else {
                Some(read_course(&page, courses, id_ref))
            }
        };
        self.doc.back();

        let course = course
            .ok_or_else(|| self.missing(courses.detail_container))?
            .ok_or_else(|| SigaaError::NotFound(format!("course {}", id_ref)))?;

        let hours = self.config.storage.course_ttl_hours;
        let ttl = i64::try_from(hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| ConfigError::Validation(format!("course-ttl-hours {} is out of range", hours)))?;
        self.stores.cache.set(&key, &course, ttl)?;
        self.stores.records.upsert(&course)?;
        Ok(course)
    }

    /// Campus filter options of the teacher search
    pub async fn campus_list(&mut self) -> Result<Vec<Campus>> {
        self.session.require_authenticated()?;

        let teachers = &self.profile.teachers;
        self.doc.navigate(teachers.path).await?;
        let page = self.doc.page();
        Ok(read_campuses(&page, teachers))
    }

    /// Runs the public teacher search
    pub async fn search_teachers(&mut self, name: &str, campus: Option<&Campus>) -> Result<Vec<TeacherResult>> {
        self.session.require_authenticated()?;

        let teachers = &self.profile.teachers;
        self.doc.navigate(teachers.path).await?;

        let campus_value = campus.map(|c| c.value.as_str()).unwrap_or(teachers.any_campus);
        let overrides = vec![
            (teachers.form_id_field.to_string(), teachers.form_id_field.to_string()),
            (teachers.name_field.to_string(), name.to_string()),
            (teachers.campus_field.to_string(), campus_value.to_string()),
            (teachers.submit_field.to_string(), teachers.submit_field.to_string()),
        ];
        self.doc.submit_page_form(teachers.form, &overrides).await?;

        let url = self.current_url();
        let page = self.doc.page();
        let results = read_teacher_results(&page, teachers, &url);
        tracing::info!("Teacher search '{}' returned {} results", name, results.len());
        Ok(results)
    }

    /// E-mail from a teacher's public page, `None` when not informed
    pub async fn teacher_email(&mut self, result: &TeacherResult) -> Result<Option<String>> {
        self.session.require_authenticated()?;

        self.doc.navigate(&result.page_url).await?;
        let email = {
            let page = self.doc.page();
            read_teacher_email(&page, &self.profile.teachers)
        };
        self.doc.back();
        Ok(email)
    }

    /// Binary downloads through the authenticated session
    pub fn downloads(&mut self) -> Result<Downloads<'_, F>> {
        self.session.require_authenticated()?;
        Ok(Downloads { doc: &mut self.doc })
    }

    /// Releases the transport; never fails
    pub async fn close(&mut self) {
        self.active_sections = None;
        self.doc.close().await;
    }

    async fn section_categories(&mut self) -> Result<Vec<CategorySelection>> {
        let sections = &self.profile.sections;
        self.doc.navigate(sections.search_path).await?;

        let departments = {
            let page = self.doc.page();
            read_departments(&page, sections)
        };
        if departments.is_empty() {
            return Err(self.missing(sections.department_options));
        }

        let wanted = &self.config.crawl.departments;
        let selected: Vec<CategorySelection> = departments
            .into_iter()
            .filter(|(value, label)| {
                wanted.is_empty()
                    || wanted.iter().any(|w| {
                        let w = w.trim();
                        w == value || w.eq_ignore_ascii_case(label)
                    })
            })
            .map(|(value, label)| CategorySelection {
                label,
                entry: sections.search_path.to_string(),
                steps: vec![FormStep {
                    form_selector: sections.search_form.to_string(),
                    overrides: vec![
                        (sections.department_field.to_string(), value),
                        (sections.submit_field.to_string(), sections.submit_value.to_string()),
                    ],
                }],
            })
            .collect();

        if selected.is_empty() {
            tracing::warn!("No department matched the configured filter {:?}", wanted);
        }
        Ok(selected)
    }

    /// Stored records of a completed crawl, unless a refresh was asked for
    fn stored_crawl<R: Record>(&self, refresh: bool) -> Result<Option<CrawlOutcome<R>>> {
        if refresh {
            return Ok(None);
        }
        let Some(completed_at) = self.stores.records.completed_at(R::KIND)? else {
            return Ok(None);
        };

        let records: Vec<R> = self.stores.records.all()?;
        tracing::info!(
            "Using {} stored {} from the crawl completed at {}",
            records.len(),
            R::KIND,
            completed_at
        );
        Ok(Some(CrawlOutcome {
            report: TraversalReport {
                reused: records.len(),
                records,
                ..TraversalReport::default()
            },
            stored: UpsertTally::default(),
            from_store: true,
        }))
    }

    /// Writes the completion marker for a full crawl that captured something
    fn finish_crawl<R: Record>(&mut self, outcome: &CrawlOutcome<R>, filtered: bool) -> Result<()> {
        let report = &outcome.report;
        if report.aborted || !report.categories_skipped.is_empty() {
            tracing::warn!(
                "{} crawl incomplete; it will resume on the next run",
                R::KIND
            );
            return Ok(());
        }
        if filtered {
            tracing::debug!("{} crawl was filtered; not marking it complete", R::KIND);
            return Ok(());
        }
        if report.records.is_empty() {
            tracing::warn!(
                "{} crawl captured no records ({} rows seen); not marking it complete",
                R::KIND,
                report.rows_seen
            );
            return Ok(());
        }
        self.stores
            .records
            .mark_complete(R::KIND, report.records.len() as u64)?;
        Ok(())
    }

    fn current_url(&self) -> Url {
        self.doc
            .current_url()
            .cloned()
            .unwrap_or_else(|| self.doc.base().clone())
    }

    fn missing(&self, container: &str) -> SigaaError {
        SigaaError::StructuralExtraction {
            url: self.current_url().to_string(),
            container: container.to_string(),
        }
    }
}

/// Upserts every record; records without a natural key are logged and skipped
fn persist<R: Record>(store: &mut SqliteRecordStore, records: &[R]) -> Result<UpsertTally> {
    let mut tally = UpsertTally::default();
    for record in records {
        match store.upsert(record) {
            Ok(outcome) => tally.record(outcome),
            Err(StorageError::ConstraintViolation(reason)) => {
                tracing::warn!("Not storing record: {}", reason);
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(
        "Stored {} {}: {} new, {} replaced, {} unchanged",
        tally.total(),
        R::KIND,
        tally.inserted,
        tally.replaced,
        tally.unchanged
    );
    Ok(tally)
}

/// Downloads keyed by record identity
///
/// Records stay plain values; anything that needs the session to fetch
/// goes through here.
pub struct Downloads<'c, F> {
    doc: &'c mut DocumentClient<F>,
}

impl<F: Fetcher> Downloads<'_, F> {
    /// Downloads `url` to `destination`
    ///
    /// When `destination` is an existing directory the file name is taken
    /// from the URL.
    pub async fn download_attachment(&mut self, url: &str, destination: &Path) -> Result<PathBuf> {
        let url = self.doc.resolve(url)?;
        let bytes = self.doc.fetch_bytes(url.as_str()).await?;

        let path = if destination.is_dir() {
            destination.join(file_name(&url, "download"))
        } else {
            destination.to_path_buf()
        };
        write_file(&path, &bytes).await?;

        tracing::info!("Saved {} bytes from {} to {}", bytes.len(), url, path.display());
        Ok(path)
    }

    /// Saves a teacher's photo into `directory`
    pub async fn download_profile_picture(&mut self, result: &TeacherResult, directory: &Path) -> Result<PathBuf> {
        let Some(picture) = result.profile_picture_url.as_deref() else {
            return Err(SigaaError::NotFound(format!("profile picture of {}", result.name)));
        };

        let url = self.doc.resolve(picture)?;
        let bytes = self.doc.fetch_bytes(url.as_str()).await?;
        let path = directory.join(file_name(&url, "photo.jpg"));
        write_file(&path, &bytes).await?;
        Ok(path)
    }
}

fn file_name(url: &Url, fallback: &str) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
