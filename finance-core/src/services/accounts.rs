use tracing::{info, warn};

use super::ServiceError;
use crate::credentials::{hash_secret, verify_secret};
use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, Session, User};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

/// Sign-up form. Secrets are hashed before they reach the store.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub security_question: String,
    pub security_answer: String,
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ServiceError::Validation(format!(
            "username must be {} to {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ServiceError::Validation(
            "username may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Security answers are compared case-insensitively, ignoring surrounding
/// whitespace.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Creates an account.
pub async fn register<R>(
    repo: &R,
    registration: Registration,
) -> Result<User, ServiceError>
where
    R: UserStore + ?Sized,
{
    let username = registration.username.trim().to_string();
    validate_username(&username)?;
    validate_password(&registration.password)?;

    let question = registration.security_question.trim();
    if question.is_empty() {
        return Err(ServiceError::Validation(
            "security question must not be empty".to_string(),
        ));
    }
    let answer = normalize_answer(&registration.security_answer);
    if answer.is_empty() {
        return Err(ServiceError::Validation(
            "security answer must not be empty".to_string(),
        ));
    }

    let new_user = NewUser {
        username: username.clone(),
        password_hash: hash_secret(&registration.password),
        security_question: question.to_string(),
        answer_hash: hash_secret(&answer),
    };

    match repo.create_user(new_user).await {
        Ok(user) => {
            info!(username = %user.username, "account registered");
            Ok(user)
        }
        Err(RepositoryError::Conflict(_)) => Err(ServiceError::Validation(format!(
            "username '{username}' is already taken"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Checks credentials and starts a session. Unknown users and wrong
/// passwords are indistinguishable to the caller.
pub async fn login<R>(
    repo: &R,
    username: &str,
    password: &str,
) -> Result<Session, ServiceError>
where
    R: UserStore + ?Sized,
{
    let username = username.trim();
    let user = match repo.get_user(username).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => {
            warn!(username, "login for unknown user");
            return Err(ServiceError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_secret(password, &user.password_hash) {
        warn!(username, "login with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    info!(username, "logged in");
    Ok(Session::start(user.username))
}

/// The question a user chose at sign-up, for password recovery.
pub async fn security_question<R>(
    repo: &R,
    username: &str,
) -> Result<String, ServiceError>
where
    R: UserStore + ?Sized,
{
    let username = username.trim();
    match repo.get_user(username).await {
        Ok(user) => Ok(user.security_question),
        Err(RepositoryError::NotFound) => Err(ServiceError::UnknownUser(username.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Replaces the password when `answer` matches the stored security answer.
/// Answers compare trimmed and case-insensitively.
pub async fn reset_password<R>(
    repo: &R,
    username: &str,
    answer: &str,
    new_password: &str,
) -> Result<(), ServiceError>
where
    R: UserStore + ?Sized,
{
    let username = username.trim();
    let user = match repo.get_user(username).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => {
            return Err(ServiceError::UnknownUser(username.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_secret(&normalize_answer(answer), &user.answer_hash) {
        warn!(username, "password reset with wrong answer");
        return Err(ServiceError::IncorrectAnswer);
    }
    validate_password(new_password)?;

    repo.update_password(username, &hash_secret(new_password))
        .await?;
    info!(username, "password reset");
    Ok(())
}

/// Re-checks the session user's password before an account change.
async fn confirm_password<R>(
    repo: &R,
    session: &Session,
    password: &str,
) -> Result<User, ServiceError>
where
    R: UserStore + ?Sized,
{
    let user = match repo.get_user(session.username()).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => {
            return Err(ServiceError::UnknownUser(session.username().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if !verify_secret(password, &user.password_hash) {
        warn!(username = session.username(), "account change with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }
    Ok(user)
}

/// Sets a new password for a logged-in user who knows the current one.
pub async fn change_password<R>(
    repo: &R,
    session: &Session,
    current_password: &str,
    new_password: &str,
) -> Result<(), ServiceError>
where
    R: UserStore + ?Sized,
{
    confirm_password(repo, session, current_password).await?;
    validate_password(new_password)?;

    repo.update_password(session.username(), &hash_secret(new_password))
        .await?;
    info!(username = session.username(), "password changed");
    Ok(())
}

/// Moves the account, its ledger and its watchlist to `new_username`.
/// Returns a session for the new name; the old one no longer resolves.
pub async fn rename_account<R>(
    repo: &R,
    session: &Session,
    password: &str,
    new_username: &str,
) -> Result<Session, ServiceError>
where
    R: UserStore + ?Sized,
{
    let new_username = new_username.trim();
    validate_username(new_username)?;
    confirm_password(repo, session, password).await?;

    if new_username == session.username() {
        return Ok(session.clone());
    }

    match repo.rename_user(session.username(), new_username).await {
        Ok(user) => {
            info!(from = session.username(), to = %user.username, "account renamed");
            Ok(Session::start(user.username))
        }
        Err(RepositoryError::Conflict(_)) => Err(ServiceError::Validation(format!(
            "username '{new_username}' is already taken"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Removes the account together with its ledger and watchlist.
pub async fn delete_account<R>(
    repo: &R,
    session: &Session,
    password: &str,
) -> Result<(), ServiceError>
where
    R: UserStore + ?Sized,
{
    confirm_password(repo, session, password).await?;

    repo.delete_user(session.username()).await?;
    info!(username = session.username(), "account deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::InMemoryRepository;

    fn registration(username: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            security_question: "Name of your first school?".to_string(),
            security_answer: "St. Mary's".to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_hashes_not_secrets() {
        let repo = InMemoryRepository::new();

        let user = register(&repo, registration("asha")).await.unwrap();

        assert_eq!(user.username, "asha");
        assert_ne!(user.password_hash, "s3cret-pass");
        assert!(!user.answer_hash.contains("mary"));
        assert!(verify_secret("s3cret-pass", &user.password_hash));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        let result = register(&repo, registration("asha")).await;

        assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg.contains("taken")));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let repo = InMemoryRepository::new();

        let short_name = register(&repo, registration("ab")).await;
        let bad_chars = register(&repo, registration("a b c")).await;
        let short_password = register(
            &repo,
            Registration {
                password: "12345".to_string(),
                ..registration("asha")
            },
        )
        .await;
        let no_answer = register(
            &repo,
            Registration {
                security_answer: "   ".to_string(),
                ..registration("asha")
            },
        )
        .await;

        for result in [short_name, bad_chars, short_password, no_answer] {
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
        assert!(repo.list_usernames().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_returns_session_for_valid_credentials() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        let session = login(&repo, "asha", "s3cret-pass").await.unwrap();

        assert_eq!(session.username(), "asha");
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        let wrong_password = login(&repo, "asha", "nope-nope").await;
        let unknown_user = login(&repo, "ghost", "s3cret-pass").await;

        assert_eq!(wrong_password, Err(ServiceError::InvalidCredentials));
        assert_eq!(unknown_user, Err(ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn security_question_for_known_and_unknown_user() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        assert_eq!(
            security_question(&repo, "asha").await.unwrap(),
            "Name of your first school?"
        );
        assert_eq!(
            security_question(&repo, "ghost").await,
            Err(ServiceError::UnknownUser("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn reset_password_with_correct_answer() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        reset_password(&repo, "asha", "  st. mary's ", "brand-new-pass")
            .await
            .unwrap();

        assert!(login(&repo, "asha", "brand-new-pass").await.is_ok());
        assert_eq!(
            login(&repo, "asha", "s3cret-pass").await,
            Err(ServiceError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn reset_password_with_wrong_answer_keeps_old_password() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();

        let result = reset_password(&repo, "asha", "St. John's", "brand-new-pass").await;

        assert_eq!(result, Err(ServiceError::IncorrectAnswer));
        assert!(login(&repo, "asha", "s3cret-pass").await.is_ok());
    }

    // =========================================================================
    // Account management
    // =========================================================================

    #[tokio::test]
    async fn change_password_needs_current_password() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();
        let session = login(&repo, "asha", "s3cret-pass").await.unwrap();

        let wrong = change_password(&repo, &session, "guess-pass", "brand-new-pass").await;
        assert_eq!(wrong, Err(ServiceError::InvalidCredentials));

        let too_short = change_password(&repo, &session, "s3cret-pass", "abc").await;
        assert!(matches!(too_short, Err(ServiceError::Validation(_))));

        change_password(&repo, &session, "s3cret-pass", "brand-new-pass")
            .await
            .unwrap();
        assert!(login(&repo, "asha", "brand-new-pass").await.is_ok());
        assert_eq!(
            login(&repo, "asha", "s3cret-pass").await,
            Err(ServiceError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn rename_account_keeps_credentials_and_data() {
        use crate::db::Watchlist;

        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();
        repo.add_symbol("asha", "TCS").await.unwrap();
        let session = login(&repo, "asha", "s3cret-pass").await.unwrap();

        let renamed = rename_account(&repo, &session, "s3cret-pass", " asha_k ")
            .await
            .unwrap();

        assert_eq!(renamed.username(), "asha_k");
        assert!(login(&repo, "asha_k", "s3cret-pass").await.is_ok());
        assert_eq!(
            login(&repo, "asha", "s3cret-pass").await,
            Err(ServiceError::InvalidCredentials)
        );
        assert_eq!(repo.list_symbols("asha_k").await.unwrap(), vec!["TCS"]);
    }

    #[tokio::test]
    async fn rename_account_rejects_taken_or_invalid_name() {
        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();
        register(&repo, registration("ravi")).await.unwrap();
        let session = login(&repo, "asha", "s3cret-pass").await.unwrap();

        let taken = rename_account(&repo, &session, "s3cret-pass", "ravi").await;
        let invalid = rename_account(&repo, &session, "s3cret-pass", "a b").await;
        let wrong_password = rename_account(&repo, &session, "nope-nope", "zed_1").await;

        assert!(matches!(taken, Err(ServiceError::Validation(msg)) if msg.contains("taken")));
        assert!(matches!(invalid, Err(ServiceError::Validation(_))));
        assert_eq!(wrong_password, Err(ServiceError::InvalidCredentials));
        assert_eq!(repo.list_usernames().await.unwrap(), vec!["asha", "ravi"]);
    }

    #[tokio::test]
    async fn delete_account_removes_user_and_data() {
        use crate::db::Watchlist;

        let repo = InMemoryRepository::new();
        register(&repo, registration("asha")).await.unwrap();
        repo.add_symbol("asha", "TCS").await.unwrap();
        let session = login(&repo, "asha", "s3cret-pass").await.unwrap();

        let wrong = delete_account(&repo, &session, "nope-nope").await;
        assert_eq!(wrong, Err(ServiceError::InvalidCredentials));
        assert!(repo.get_user("asha").await.is_ok());

        delete_account(&repo, &session, "s3cret-pass").await.unwrap();

        assert_eq!(
            login(&repo, "asha", "s3cret-pass").await,
            Err(ServiceError::InvalidCredentials)
        );
        assert!(repo.list_symbols("asha").await.unwrap().is_empty());
        assert_eq!(
            delete_account(&repo, &session, "s3cret-pass").await,
            Err(ServiceError::UnknownUser("asha".to_string()))
        );
    }
}
