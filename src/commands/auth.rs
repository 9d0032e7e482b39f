//! Session command handlers.
//!
//! This module implements the CLI commands for:
//! - `expense login` - Log in and store the credential
//! - `expense signup` - Create an account and log in as it
//! - `expense logout` - Forget the stored credential
//! - `expense whoami` - Show who is logged in

use crate::api::Mode;
use crate::commands::{Client, Out};
use crate::model::User;
use crate::Result;
use std::path::Path;

/// Handles the `expense login` command.
///
/// # Errors
/// - `ErrorType::InvalidCredentials` if the API rejects the email and password.
/// - `ErrorType::Timeout` if the API does not answer in time.
pub async fn login(
    expense_home: &Path,
    mode: Mode,
    email: &str,
    password: &str,
) -> Result<Out<User>> {
    let client = Client::connect(expense_home, mode).await?;
    let user = client.session.login(email, password).await?;
    Ok(Out::new(
        format!("Logged in as {} <{}>", user.name, user.email),
        user,
    ))
}

/// Handles the `expense signup` command.
///
/// # Errors
/// - `ErrorType::SignupFailed` if the API rejects the signup, for example when the email is taken.
pub async fn signup(
    expense_home: &Path,
    mode: Mode,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Out<User>> {
    let client = Client::connect(expense_home, mode).await?;
    let user = client.session.signup(name, email, password).await?;
    Ok(Out::new(
        format!("Created an account for {} and logged in", user.email),
        user,
    ))
}

/// Handles the `expense logout` command. This never contacts the API.
pub async fn logout(expense_home: &Path, mode: Mode) -> Result<Out<()>> {
    let client = Client::connect(expense_home, mode).await?;
    let was = client.session.session().user().map(|u| u.email.clone());
    client.session.logout().await;
    Ok(match was {
        Some(email) => format!("Logged out {email}").into(),
        None => "Nobody was logged in".into(),
    })
}

/// Handles the `expense whoami` command.
///
/// # Errors
/// - `ErrorType::Unauthenticated` if nobody is logged in.
pub async fn whoami(expense_home: &Path, mode: Mode) -> Result<Out<User>> {
    let client = Client::connect(expense_home, mode).await?;
    let user = client.session.require_user()?;
    Ok(Out::new(format!("{} <{}>", user.name, user.email), user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::error::ErrorType;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_login_whoami_logout() {
        let env = TestEnv::new().await;
        let home = env.config().root().to_path_buf();

        let err = whoami(&home, Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorType::Unauthenticated);

        let out = login(&home, Mode::Test, DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().email, DEMO_EMAIL);

        let out = whoami(&home, Mode::Test).await.unwrap();
        assert!(out.message().contains(DEMO_EMAIL));

        let out = logout(&home, Mode::Test).await.unwrap();
        assert_eq!(out.message(), format!("Logged out {DEMO_EMAIL}"));
        assert!(whoami(&home, Mode::Test).await.is_err());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let env = TestEnv::new().await;
        let home = env.config().root().to_path_buf();
        let err = login(&home, Mode::Test, DEMO_EMAIL, "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorType::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_signup() {
        let env = TestEnv::new().await;
        let home = env.config().root().to_path_buf();
        let out = signup(&home, Mode::Test, "Meera", "meera@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().name, "Meera");
        assert!(env.store().load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_home() {
        let env = TestEnv::new().await;
        let home = env.config().root().join("nope");
        let err = whoami(&home, Mode::Test).await.unwrap_err();
        assert_eq!(err.kind(), ErrorType::Config);
    }
}
