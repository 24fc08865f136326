#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, sync::Arc};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    StepikError,
    options::{migrate_reply, task_from_step},
    solutions::SolutionSource,
    utils::set_course_language,
    wrappers::{
        CoursesList, LessonsList, ProgressesList, RemoteCourse, Reply, SectionsList, StepikLesson,
        StepikSection, StepikUser, StepsList, SubmissionsList, UnitsList, UsersList,
    },
};
use crate::{
    auth::{OAuthAccount, OAuthClient, authorize},
    config::ConfigHandle,
    constants::{PROGRESS_ID_PREFIX, STEPIK_API_PATH, STEPIK_CURRENT_USER, STEPIK_OAUTH_PATH},
    course::{Course, CourseKind, Lesson, Section, StudyItem},
    format::{ADDITIONAL_MATERIALS, PYCHARM_ADDITIONAL},
};

/// A logged-in Stepik user.
pub type StepikAccount = OAuthAccount<StepikUser>;

/// Largest number of ids Stepik accepts in one list request.
const MAX_IDS_PER_REQUEST: usize = 100;

/// Stepik REST client.
///
/// Requests carry the account's bearer token when someone is logged in. A
/// stale token is refreshed first; if that fails the request goes out
/// anonymously.
#[derive(Clone)]
pub struct StepikClient {
    /// Shared HTTP client.
    http:     Client,
    /// Site URL without a trailing slash.
    site_url: String,
    /// OAuth client of the Stepik integration.
    oauth:    OAuthClient,
    /// Logged-in account, if any.
    account:  Arc<Mutex<Option<StepikAccount>>>,
}

impl StepikClient {
    /// A client for the Stepik site at `site_url`.
    pub fn new(http: Client, site_url: &str, client_id: &str) -> Self {
        let site_url = site_url.trim_end_matches('/').to_string();
        let oauth = OAuthClient::builder()
            .http(http.clone())
            .authorize_url(format!("{site_url}/oauth2/authorize/"))
            .token_url(format!("{site_url}/oauth2/token/"))
            .client_id(client_id)
            .build();
        Self {
            http,
            site_url,
            oauth,
            account: Arc::new(Mutex::new(None)),
        }
    }

    /// A client configured from the environment.
    pub fn from_config(config: &ConfigHandle) -> Self {
        Self::new(config.http_client(), config.stepik_url(), config.stepik_client_id())
    }

    /// The same client acting on behalf of `account`.
    pub fn with_account(self, account: Option<StepikAccount>) -> Self {
        Self {
            account: Arc::new(Mutex::new(account)),
            ..self
        }
    }

    /// Site URL.
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Current account, refreshed tokens included.
    pub async fn account(&self) -> Option<StepikAccount> {
        self.account.lock().await.clone()
    }

    /// Full API URL of `link`.
    fn api_url(&self, link: &str) -> String {
        let separator = if link.starts_with('/') { "" } else { "/" };
        format!("{}{STEPIK_API_PATH}{separator}{link}", self.site_url)
    }

    /// A valid access token, refreshing it when it is about to expire.
    ///
    /// Returns `None` when nobody is logged in or the refresh failed.
    pub async fn access_token(&self) -> Option<String> {
        let mut guard = self.account.lock().await;
        let account = guard.as_mut()?;
        if !account.is_token_up_to_date() {
            debug!("Refreshing Stepik tokens of user {}", account.user_info.id);
            match self.oauth.refresh(&account.token_info.refresh_token).await {
                Ok(tokens) => account.update_tokens(tokens),
                Err(e) => {
                    warn!("Failed to refresh Stepik tokens: {e}");
                    return None;
                }
            }
        }
        Some(account.token_info.access_token.clone())
    }

    /// GETs `link`, authorized when possible.
    pub async fn get<T: DeserializeOwned>(
        &self,
        link: &str,
        query: &[(&str, String)],
    ) -> Result<T, StepikError> {
        let token = self.access_token().await;
        self.send(link, query, token.as_deref()).await
    }

    /// GETs `link` with an explicit token.
    async fn send<T: DeserializeOwned>(
        &self,
        link: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, StepikError> {
        let mut request = self.http.get(self.api_url(link)).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(StepikError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// GETs every object of `resource` with the given ids, in batches.
    async fn by_ids<E, T>(
        &self,
        resource: &str,
        ids: &[String],
        unwrap: impl Fn(E) -> Vec<T>,
    ) -> Result<Vec<T>, StepikError>
    where
        E: DeserializeOwned,
    {
        let mut objects = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let query: Vec<(&str, String)> = batch.iter().map(|id| ("ids[]", id.clone())).collect();
            let envelope: E = self.get(resource, &query).await?;
            objects.extend(unwrap(envelope));
        }
        Ok(objects)
    }

    /// Consent page URL for `redirect_uri`.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, StepikError> {
        Ok(self.oauth.authorization_url(redirect_uri)?)
    }

    /// Exchanges an authorization code and becomes the resulting account.
    pub async fn login(&self, code: &str, redirect_uri: &str) -> Result<StepikAccount, StepikError> {
        let tokens = self.oauth.exchange_code(code, redirect_uri).await?;
        let user = self.current_user(&tokens.access_token).await?;
        info!("Logged in to Stepik as {} {}", user.first_name, user.last_name);
        let account = StepikAccount::new(user, tokens);
        *self.account.lock().await = Some(account.clone());
        Ok(account)
    }

    /// Logs in through the browser.
    pub async fn login_interactively(&self) -> Result<StepikAccount, StepikError> {
        let received = authorize(&self.oauth, STEPIK_OAUTH_PATH).await?;
        self.login(&received.code, &received.redirect_uri).await
    }

    /// The user `access_token` belongs to.
    pub async fn current_user(&self, access_token: &str) -> Result<StepikUser, StepikError> {
        let users: UsersList = self.send(STEPIK_CURRENT_USER, &[], Some(access_token)).await?;
        users
            .users
            .into_iter()
            .next()
            .ok_or_else(|| StepikError::Malformed("no current user".into()))
    }

    /// Course `id` as Stepik describes it.
    pub async fn course_info(&self, id: u64) -> Result<RemoteCourse, StepikError> {
        let list: CoursesList = self.get(&format!("/courses/{id}"), &[]).await?;
        list.courses
            .into_iter()
            .next()
            .ok_or_else(|| StepikError::Malformed(format!("course {id} not found")))
    }

    /// Every course that can be opened in an IDE.
    pub async fn idea_compatible_courses(&self) -> Result<Vec<RemoteCourse>, StepikError> {
        let mut courses = Vec::new();
        let mut page = 1;
        loop {
            let query = [("is_idea_compatible", "true".to_string()), ("page", page.to_string())];
            let list: CoursesList = self.get("/courses", &query).await?;
            courses.extend(list.courses);
            if !list.meta.has_next {
                break;
            }
            page += 1;
        }
        Ok(courses)
    }

    /// Loads course `id` with its sections, lessons and tasks.
    ///
    /// A course with a single section keeps its lessons at the top level.
    pub async fn load_course(&self, id: u64) -> Result<Course, StepikError> {
        let remote = self.course_info(id).await?;
        let mut course = Course::builder()
            .id(remote.id)
            .name(remote.title.clone())
            .description(remote.summary.clone())
            .course_type(remote.course_format.clone())
            .update_date(remote.update_date)
            .build();
        if !remote.language.is_empty() {
            course.language = remote.language.clone();
        }
        course.kind = CourseKind::Stepik {
            is_public:   remote.is_public,
            is_adaptive: remote.is_adaptive,
        };
        set_course_language(&mut course, &remote.course_format);

        let sections: Vec<StepikSection> = self
            .by_ids("/sections", &to_ids(&remote.sections), |l: SectionsList| l.sections)
            .await?;
        let mut items = Vec::with_capacity(sections.len());
        for section in &sections {
            let lessons = self.load_lessons(section, &course.programming_language).await?;
            items.push(StudyItem::Section(Section {
                id: section.id,
                name: section.title.clone(),
                update_date: section.update_date,
                lessons,
                ..Section::default()
            }));
        }

        course.items = match <[StudyItem; 1]>::try_from(items) {
            Ok([StudyItem::Section(only)]) => only.lessons.into_iter().map(StudyItem::Lesson).collect(),
            Ok(single) => single.into(),
            Err(items) => items,
        };
        course.init();
        Ok(course)
    }

    /// Lessons of `section` in unit order, with their tasks.
    async fn load_lessons(
        &self,
        section: &StepikSection,
        language: &str,
    ) -> Result<Vec<Lesson>, StepikError> {
        let units = self
            .by_ids("/units", &to_ids(&section.units), |l: UnitsList| l.units)
            .await?;
        let lesson_ids: Vec<u64> = units.iter().map(|u| u.lesson).collect();
        let remote: HashMap<u64, StepikLesson> = self
            .by_ids("/lessons", &to_ids(&lesson_ids), |l: LessonsList| l.lessons)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let mut lessons = Vec::with_capacity(units.len());
        for unit in units {
            let Some(remote) = remote.get(&unit.lesson) else {
                warn!("Lesson {} of unit {} is missing", unit.lesson, unit.id);
                continue;
            };
            let steps = self
                .by_ids("/steps", &to_ids(&remote.steps), |l: StepsList| l.steps)
                .await?;
            let mut tasks = Vec::with_capacity(steps.len());
            for step in &steps {
                if let Some(task) = task_from_step(step, language)? {
                    tasks.push(task);
                }
            }

            let name = if remote.title == PYCHARM_ADDITIONAL {
                ADDITIONAL_MATERIALS.to_string()
            } else {
                remote.title.clone()
            };
            lessons.push(Lesson {
                id: remote.id,
                name,
                update_date: remote.update_date,
                tasks,
                unit_id: unit.id,
                ..Lesson::default()
            });
        }
        Ok(lessons)
    }

    /// Whether each step is solved, `None` where Stepik has no progress.
    pub async fn task_statuses(&self, step_ids: &[u64]) -> Result<Vec<Option<bool>>, StepikError> {
        let progress_ids: Vec<String> = step_ids
            .iter()
            .map(|id| format!("{PROGRESS_ID_PREFIX}{id}"))
            .collect();
        let passed: HashMap<String, bool> = self
            .by_ids("/progresses", &progress_ids, |l: ProgressesList| l.progresses)
            .await?
            .into_iter()
            .map(|p| (p.id, p.is_passed))
            .collect();
        Ok(progress_ids.iter().map(|id| passed.get(id).copied()).collect())
    }

    /// Newest correct (or wrong, when unsolved) submission reply on a step.
    pub async fn last_submission(
        &self,
        step_id: u64,
        is_solved: bool,
        language: &str,
    ) -> Result<Option<Reply>, StepikError> {
        let status = if is_solved { "correct" } else { "wrong" };
        let query = [
            ("step", step_id.to_string()),
            ("status", status.to_string()),
            ("order", "desc".to_string()),
        ];
        let list: SubmissionsList = self.get("/submissions", &query).await?;
        match list.submissions.into_iter().find_map(|s| s.reply) {
            Some(reply) => Ok(Some(migrate_reply(reply, language)?)),
            None => Ok(None),
        }
    }
}

impl SolutionSource for StepikClient {
    async fn task_statuses(&self, step_ids: &[u64]) -> Result<Vec<Option<bool>>, StepikError> {
        StepikClient::task_statuses(self, step_ids).await
    }

    async fn last_submission(
        &self,
        step_id: u64,
        is_solved: bool,
        language: &str,
    ) -> Result<Option<Reply>, StepikError> {
        StepikClient::last_submission(self, step_id, is_solved, language).await
    }
}

/// Ids formatted for a list query.
fn to_ids(ids: &[u64]) -> Vec<String> {
    ids.iter().map(u64::to_string).collect()
}
