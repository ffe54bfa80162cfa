//! Session provisioning: launch the browser, sign in, open the profile.
//!
//! Every step is fatal on failure and nothing is retried. When a step fails
//! after the browser started, the browser is closed before the error is
//! returned.

use feedscroll::{FeedSession, SessionError};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{Config, Credentials, LoginOptions};
use crate::renderer::chromium::ChromiumSession;

const IDENTIFIER_FIELD: &str = r#"input[name="text"]"#;
const PASSWORD_FIELD: &str = r#"input[name="password"]"#;

/// Reports which sign-in field is currently waiting for input.
///
/// A password field wins; an identifier field only counts while it is empty,
/// so the field just submitted is not mistaken for a new prompt.
const PROMPT_SCRIPT: &str = r#"(() => {
    if (document.querySelector('input[name="password"]')) return "password";
    const t = document.querySelector('input[name="text"]');
    if (t && t.value === '') return "identifier";
    return null;
})()"#;

/// The sign-in prompt the page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prompt {
    Identifier,
    Password,
}

/// Launch Chromium, sign in and open the target profile.
///
/// The returned session is positioned on `config.target_url` with at least
/// one post rendered.
pub async fn provision(config: &Config) -> Result<ChromiumSession, SessionError> {
    let session = ChromiumSession::launch(&config.browser).await?;

    let post_tag = &config.scroll.site.post_tag;
    let prepared = async {
        sign_in(&session, &config.credentials, &config.login).await?;
        open_profile(&session, &config.target_url, post_tag, &config.login).await
    }
    .await;

    match prepared {
        Ok(()) => Ok(session),
        Err(e) => {
            warn!("provisioning failed, closing browser: {e}");
            if let Err(close_err) = Box::new(session).close().await {
                warn!("browser close failed: {close_err}");
            }
            Err(e)
        }
    }
}

/// Walk the multi-step sign-in form.
pub async fn sign_in(
    session: &ChromiumSession,
    credentials: &Credentials,
    opts: &LoginOptions,
) -> Result<(), SessionError> {
    info!(url = %opts.login_url, "opening sign-in page");
    session.goto(&opts.login_url).await?;

    let field = session
        .wait_for_element(IDENTIFIER_FIELD, opts.field_timeout)
        .await?;
    session.submit_field(&field, &credentials.email).await?;
    info!("email submitted");

    // Some sign-ins ask for the username before the password.
    match wait_for_prompt(session, opts.second_prompt_timeout).await? {
        Some(Prompt::Identifier) => {
            let second = session
                .wait_for_element(IDENTIFIER_FIELD, opts.field_timeout)
                .await?;
            session.submit_field(&second, &credentials.username).await?;
            info!("username submitted");
        }
        Some(Prompt::Password) | None => {
            info!("no second sign-in prompt detected, proceeding");
        }
    }

    let password = session
        .wait_for_element(PASSWORD_FIELD, opts.field_timeout)
        .await?;
    session.submit_field(&password, &credentials.password).await?;
    info!("password submitted");

    tokio::time::sleep(opts.settle).await;
    Ok(())
}

/// Navigate to the profile and wait for the first post to render.
pub async fn open_profile(
    session: &ChromiumSession,
    target_url: &str,
    post_tag: &str,
    opts: &LoginOptions,
) -> Result<(), SessionError> {
    info!(url = %target_url, "opening profile");
    session.goto(target_url).await?;
    session
        .wait_for_element(post_tag, opts.feed_timeout)
        .await?;
    if let Ok(Some(url)) = session.current_url().await {
        info!(%url, "profile ready");
    }
    Ok(())
}

/// Poll the page for the next sign-in prompt until `timeout`.
///
/// The prompt script answers `null` while the page sits between steps; that keeps
/// the poll going rather than failing it.
async fn wait_for_prompt(
    session: &ChromiumSession,
    timeout: std::time::Duration,
) -> Result<Option<Prompt>, SessionError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let prompt: Option<Prompt> = session.eval(PROMPT_SCRIPT).await?;
        if prompt.is_some() || tokio::time::Instant::now() >= deadline {
            return Ok(prompt);
        }
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::chromium::decode_evaluation;
    use chromiumoxide::cdp::js_protocol::runtime::RemoteObject;
    use chromiumoxide::js::EvaluationResult;
    use serde_json::json;

    fn prompt_answer(object: serde_json::Value) -> Result<Option<Prompt>, SessionError> {
        let remote: RemoteObject = serde_json::from_value(object).unwrap();
        decode_evaluation(EvaluationResult::new(remote))
    }

    #[test]
    fn test_no_prompt_yet_keeps_polling() {
        let answer = prompt_answer(json!({"type": "object", "subtype": "null", "value": null}));
        assert_eq!(answer.unwrap(), None);
    }

    #[test]
    fn test_prompt_answers_decode() {
        let answer = prompt_answer(json!({"type": "string", "value": "identifier"}));
        assert_eq!(answer.unwrap(), Some(Prompt::Identifier));
        let answer = prompt_answer(json!({"type": "string", "value": "password"}));
        assert_eq!(answer.unwrap(), Some(Prompt::Password));
    }

    #[test]
    fn test_unknown_prompt_answer_is_a_script_error() {
        let answer = prompt_answer(json!({"type": "string", "value": "captcha"}));
        assert!(matches!(answer, Err(SessionError::Script(_))));
    }

    #[test]
    fn test_prompt_decodes_from_json_values() {
        let p: Option<Prompt> = serde_json::from_str(r#""identifier""#).unwrap();
        assert_eq!(p, Some(Prompt::Identifier));
        let p: Option<Prompt> = serde_json::from_str(r#""password""#).unwrap();
        assert_eq!(p, Some(Prompt::Password));
        let p: Option<Prompt> = serde_json::from_str("null").unwrap();
        assert_eq!(p, None);
    }

    #[test]
    fn test_script_checks_password_first() {
        let pw = PROMPT_SCRIPT.find("password").unwrap();
        let id = PROMPT_SCRIPT.find(r#"input[name="text"]"#).unwrap();
        assert!(pw < id);
    }
}
