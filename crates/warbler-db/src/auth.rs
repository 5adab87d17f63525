use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::debug;

use crate::models::{NewUser, UserRow};
use crate::{Database, DbError, Result};

impl NewUser {
    /// Hash the password with Argon2id and build an unpersisted user.
    ///
    /// Fails with [`DbError::EmptyPassword`] before touching the store when the
    /// password is missing or empty. Uniqueness and presence of `username` and
    /// `email` are left to [`Database::insert_user`].
    pub fn signup(
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Self> {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(DbError::EmptyPassword)?;

        Ok(Self {
            id: None,
            username: username.map(str::to_owned),
            email: email.map(str::to_owned),
            password: hash_password(password)?,
            image_url: image_url.filter(|u| !u.is_empty()).map(str::to_owned),
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| DbError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl Database {
    /// Look up `username` and check `password` against its stored hash.
    /// Unknown usernames and wrong passwords both yield `Ok(None)`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            debug!("authenticate: no user named {}", username);
            return Ok(None);
        };

        if verify_password(password, &user.password)? {
            Ok(Some(user))
        } else {
            debug!("authenticate: wrong password for {}", username);
            Ok(None)
        }
    }
}
