//! Navigation shell: authentication gate plus the view that is currently open.

pub mod render;

use reqwest::Url;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::app_state::AppState;
use crate::controllers::{
    configurations::ConfigurationManager, documents::DocumentAnalyzer, prompts::PromptManager,
    verification::VerificationController,
};
use crate::services::auth::AuthError;

/// Menu entries, addressed by their string id (`dashboard`, `analyzer`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum View {
    #[default]
    Dashboard,
    Analyzer,
    Verification,
    Prompts,
    Configs,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Analyzer => "Document Analyzer",
            View::Verification => "Advanced Verification",
            View::Prompts => "Prompt Manager",
            View::Configs => "Configuration",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            View::Dashboard => "Overview of the available tools.",
            View::Analyzer => {
                "Upload and analyze documents to extract information and detect potential fraud."
            }
            View::Verification => {
                "Use AI agent technology for in-depth document verification with interactive feedback."
            }
            View::Prompts => "Create and manage prompts used for document analysis and verification.",
            View::Configs => {
                "Manage system configurations including model settings and inference parameters."
            }
        }
    }

    /// Views reachable from the dashboard cards.
    pub fn features() -> impl Iterator<Item = View> {
        View::iter().filter(|v| *v != View::Dashboard)
    }
}

/// Hosted-UI links offered to signed-out users.
#[derive(Debug, Clone)]
pub struct GuestLinks {
    pub sign_in: Url,
    pub sign_up: Url,
    pub forgot_password: Url,
}

/// What the shell shows: the guest page, or the app with a selected view.
#[derive(Debug, Clone)]
pub enum Screen {
    Guest(GuestLinks),
    App { view: View, username: Option<String> },
}

/// The open view together with the state it owns. Replacing it drops the old view, which
/// for verification cancels the status poll.
pub enum ActiveView {
    Dashboard,
    Analyzer(DocumentAnalyzer),
    Verification(VerificationController),
    Prompts(PromptManager),
    Configs(ConfigurationManager),
}

impl ActiveView {
    pub fn view(&self) -> View {
        match self {
            ActiveView::Dashboard => View::Dashboard,
            ActiveView::Analyzer(_) => View::Analyzer,
            ActiveView::Verification(_) => View::Verification,
            ActiveView::Prompts(_) => View::Prompts,
            ActiveView::Configs(_) => View::Configs,
        }
    }
}

pub struct Shell {
    state: AppState,
    active: Option<ActiveView>,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        Self { state, active: None }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn screen(&self) -> Result<Screen, AuthError> {
        if !self.state.session.is_authenticated().await {
            let idp = self.state.session.identity_provider();
            return Ok(Screen::Guest(GuestLinks {
                sign_in: idp.login_url()?,
                sign_up: idp.signup_url()?,
                forgot_password: idp.forgot_password_url()?,
            }));
        }
        Ok(Screen::App {
            view: self.active.as_ref().map_or(View::Dashboard, ActiveView::view),
            username: self.state.session.username().await,
        })
    }

    /// Open `view`, handing it the current access token. The previous view is torn down
    /// first.
    pub async fn open(&mut self, view: View) -> Result<&mut ActiveView, AuthError> {
        self.close();
        let token = self.state.session.access_token().await?;
        let backend = self.state.backend.clone();
        tracing::debug!(view = %view, "Opening view");

        let active = match view {
            View::Dashboard => ActiveView::Dashboard,
            View::Analyzer => ActiveView::Analyzer(DocumentAnalyzer::new(backend, token)),
            View::Verification => ActiveView::Verification(VerificationController::new(
                backend,
                token,
                self.state.config.poll_interval(),
            )),
            View::Prompts => ActiveView::Prompts(PromptManager::new(backend, token)),
            View::Configs => ActiveView::Configs(ConfigurationManager::new(backend, token)),
        };
        Ok(self.active.insert(active))
    }

    pub fn active(&mut self) -> Option<&mut ActiveView> {
        self.active.as_mut()
    }

    pub fn close(&mut self) {
        if let Some(previous) = self.active.take() {
            tracing::debug!(view = %previous.view(), "Closing view");
        }
    }

    /// Close the open view and end the session. Returns the provider's logout URL.
    pub async fn sign_out(&mut self) -> Result<Url, AuthError> {
        self.close();
        self.state.session.sign_out().await
    }
}
