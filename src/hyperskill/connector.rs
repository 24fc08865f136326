use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, info, warn};

use super::{
    HyperskillAccount, HyperskillProject, HyperskillStage, HyperskillTopic, HyperskillUserInfo,
};
use crate::{
    auth::{OAuthClient, authorize},
    config::ConfigHandle,
    constants::HYPERSKILL_OAUTH_PATH,
    course::{Course, CourseKind, Lesson, LessonKind, StudyItem, Task},
};

/// `users` envelope.
#[derive(Deserialize)]
struct UsersData {
    /// Users in response order.
    #[serde(default)]
    users: Vec<HyperskillUserInfo>,
}

/// `stages` envelope.
#[derive(Deserialize)]
struct StagesData {
    /// Stages in order.
    #[serde(default)]
    stages: Vec<HyperskillStage>,
}

/// `topics` envelope.
#[derive(Deserialize)]
struct TopicsData {
    /// Topics of a stage.
    #[serde(default)]
    topics: Vec<HyperskillTopic>,
}

/// Hyperskill REST client.
#[derive(Clone)]
pub struct HyperskillConnector {
    /// Shared HTTP client.
    http:     Client,
    /// Site URL without a trailing slash.
    site_url: String,
    /// OAuth client of the integration.
    oauth:    OAuthClient,
    /// Logged-in account, if any.
    account:  Arc<Mutex<Option<HyperskillAccount>>>,
}

impl HyperskillConnector {
    /// A connector for the site at `site_url`.
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

    /// A connector configured from the environment.
    pub fn from_config(config: &ConfigHandle) -> Self {
        Self::new(config.http_client(), config.hyperskill_url(), config.hyperskill_client_id())
    }

    /// The same connector acting on behalf of `account`.
    pub fn with_account(self, account: Option<HyperskillAccount>) -> Self {
        Self {
            account: Arc::new(Mutex::new(account)),
            ..self
        }
    }

    /// Current account, refreshed tokens included.
    pub async fn account(&self) -> Option<HyperskillAccount> {
        self.account.lock().await.clone()
    }

    /// Access token of the account, refreshed when stale. A failed refresh
    /// keeps the old token.
    async fn access_token(&self) -> Option<String> {
        let mut guard = self.account.lock().await;
        let account = guard.as_mut()?;
        if !account.is_token_up_to_date() {
            match self.oauth.refresh(&account.token_info.refresh_token).await {
                Ok(tokens) => account.update_tokens(tokens),
                Err(e) => warn!("Failed to refresh Hyperskill tokens: {e}"),
            }
        }
        Some(account.token_info.access_token.clone())
    }

    /// GETs `api/<link>`.
    async fn get<T: DeserializeOwned>(&self, link: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/api/{link}", self.site_url);
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = self.access_token().await {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Could not reach {url}"))?
            .error_for_status()
            .with_context(|| format!("Hyperskill rejected {url}"))?;
        response
            .json()
            .await
            .with_context(|| format!("Could not parse the response from {url}"))
    }

    /// Exchanges an authorization code, then loads the user it belongs to.
    pub async fn login(&self, code: &str, redirect_uri: &str) -> Result<HyperskillAccount> {
        let tokens = self
            .oauth
            .exchange_code(code, redirect_uri)
            .await
            .context("Could not get Hyperskill tokens")?;
        *self.account.lock().await = Some(HyperskillAccount::new(HyperskillUserInfo::default(), tokens));

        let user = self.current_user().await?;
        info!("Logged in to Hyperskill as {}", user.fullname);
        let mut guard = self.account.lock().await;
        let account = guard.as_mut().context("Account was removed during login")?;
        account.user_info = user;
        Ok(account.clone())
    }

    /// Logs in through the browser.
    pub async fn login_interactively(&self) -> Result<HyperskillAccount> {
        let received = authorize(&self.oauth, HYPERSKILL_OAUTH_PATH).await?;
        self.login(&received.code, &received.redirect_uri).await
    }

    /// The logged-in user.
    pub async fn current_user(&self) -> Result<HyperskillUserInfo> {
        let data: UsersData = self.get("users/0", &[]).await?;
        data.users
            .into_iter()
            .next()
            .context("Hyperskill returned no current user")
    }

    /// Stages of project `project_id`.
    pub async fn stages(&self, project_id: u64) -> Result<Vec<HyperskillStage>> {
        let data: StagesData = self
            .get("stages", &[("project", project_id.to_string())])
            .await?;
        Ok(data.stages)
    }

    /// Leaf topics of stage `stage_id`.
    pub async fn topics(&self, stage_id: u64) -> Result<Vec<HyperskillTopic>> {
        let data: TopicsData = self
            .get("topics", &[("stage", stage_id.to_string())])
            .await?;
        Ok(data
            .topics
            .into_iter()
            .filter(|topic| topic.children.is_empty())
            .collect())
    }

    /// A course for `project`: one framework lesson with a task per stage.
    pub async fn project_course(&self, project: &HyperskillProject) -> Result<Course> {
        let stages = self
            .stages(project.id)
            .await
            .with_context(|| format!("Could not load the stages of project {}", project.id))?;
        let tasks = stages
            .iter()
            .map(|stage| Task::builder().name(stage.title.clone()).build())
            .collect();
        let lesson = Lesson {
            id: project.lesson,
            name: project.title.clone(),
            kind: LessonKind::Framework,
            tasks,
            ..Lesson::default()
        };

        let mut course = Course::builder()
            .id(project.id)
            .name(project.title.clone())
            .description(project.description.clone())
            .course_type("Hyperskill")
            .items(vec![StudyItem::Lesson(lesson)])
            .build();
        course.kind = CourseKind::Hyperskill {
            stages,
            task_to_topics: Default::default(),
        };
        course.init();
        Ok(course)
    }

    /// Loads the leaf topics of every stage of a Hyperskill course, keyed by
    /// stage index. Stages whose topics cannot be loaded are left out.
    pub async fn fill_topics(&self, course: &mut Course) {
        let CourseKind::Hyperskill {
            stages,
            task_to_topics,
        } = &mut course.kind
        else {
            debug!("`{}` is not a Hyperskill course", course.name);
            return;
        };

        let mut requests = JoinSet::new();
        for (index, stage) in stages.iter().enumerate() {
            let connector = self.clone();
            let stage_id = stage.id;
            requests.spawn(async move { (index, stage_id, connector.topics(stage_id).await) });
        }

        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok((index, _, Ok(topics))) if !topics.is_empty() => {
                    task_to_topics.insert(index, topics);
                }
                Ok((_, _, Ok(_))) => {}
                Ok((_, stage_id, Err(e))) => warn!("Failed to get topics for stage {stage_id}: {e:#}"),
                Err(e) => warn!("Topic request failed: {e}"),
            }
        }
    }
}
