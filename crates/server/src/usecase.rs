//! User use-cases: business rules sequenced around the store.
//!
//! The trait boundary exists so handler tests can substitute fakes; the
//! single production implementation is [`UserService`].

use crate::auth::AuthenticatedUser;
use crate::dto::{
    LoginRequest, LoginResponse, SignUpRequest, SignUpResponse, UpdateStatusRequest,
    UpdateUserRequest, UserDetailResponse,
};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use roster_auth::JwtCodec;
use roster_core::UserType;
use roster_db::{
    DbError, LockingOpt, NewUser, StatusChange, TxOptions, UserChanges, UserRepo, UserStore,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// User account use-cases.
#[async_trait]
pub trait UserUsecase: Send + Sync {
    /// Register a new account.
    async fn sign_up(&self, request: SignUpRequest) -> ApiResult<SignUpResponse>;

    /// Exchange credentials for an access token.
    async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse>;

    /// Look up the caller's account.
    async fn detail(&self, user_id: i64) -> ApiResult<UserDetailResponse>;

    /// Apply a guarded partial update to the caller's account.
    async fn partial_update(
        &self,
        caller: &AuthenticatedUser,
        request: UpdateUserRequest,
    ) -> ApiResult<()>;

    /// Flip the caller's active flag.
    async fn transition_status(
        &self,
        caller: &AuthenticatedUser,
        request: UpdateStatusRequest,
    ) -> ApiResult<()>;
}

/// Production use-case implementation backed by a [`UserStore`].
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: Arc<JwtCodec>,
    bcrypt_cost: Option<u32>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtCodec>, bcrypt_cost: Option<u32>) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }
}

#[async_trait]
impl UserUsecase for UserService {
    async fn sign_up(&self, request: SignUpRequest) -> ApiResult<SignUpResponse> {
        if self.store.email_exists(&request.email).await? {
            return Err(ApiError::Conflict(format!(
                "email '{}' already exists",
                request.email
            )));
        }

        let password = roster_auth::hash_password(&request.password, self.bcrypt_cost).await?;
        let now = OffsetDateTime::now_utc();
        let user = NewUser {
            email: request.email.clone(),
            password,
            fullname: request.fullname,
            phone_number: request.phone_number,
            user_type: UserType::Regular.as_str().to_string(),
            is_active: true,
            created_at: now,
            // Self-registration: the account is its own creating actor.
            created_by: request.email,
        };

        // A concurrent sign-up racing past the existence check still loses
        // here on the unique index, surfacing as a conflict.
        let user_id = self.store.create_user(&user).await?;

        tracing::info!(user_id, "user registered");
        Ok(SignUpResponse { user_id })
    }

    async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        // An unknown email and a wrong password are indistinguishable to the
        // caller, so login cannot be used to probe for accounts.
        let user = match self.store.get_user_by_email(&request.email).await {
            Ok(user) => user,
            Err(DbError::NotFound(_)) => {
                return Err(ApiError::Unauthorized(
                    "invalid email or password".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        if !roster_auth::verify_password(&request.password, &user.password).await? {
            return Err(ApiError::Unauthorized(
                "invalid email or password".to_string(),
            ));
        }

        let issued = self.jwt.issue(user.user_id, &user.email)?;
        tracing::info!(user_id = user.user_id, "login succeeded");

        Ok(LoginResponse {
            access_token: issued.token,
            expired_at: issued.expires_at,
        })
    }

    async fn detail(&self, user_id: i64) -> ApiResult<UserDetailResponse> {
        let user = self.store.get_user_by_id(user_id, LockingOpt::none()).await?;
        Ok(UserDetailResponse::from(user))
    }

    async fn partial_update(
        &self,
        caller: &AuthenticatedUser,
        request: UpdateUserRequest,
    ) -> ApiResult<()> {
        let user_id = caller.user_id;
        let updated_by = caller.email.clone();

        self.store
            .atomic(
                TxOptions::default(),
                Box::new(move |repo| {
                    Box::pin(async move {
                        // Blocking lock: a concurrent writer to the same row
                        // waits behind this transaction, so its later read
                        // observes this update (no lost updates).
                        let current = repo
                            .get_user_by_id(user_id, LockingOpt::for_update())
                            .await?;

                        if let Some(email) = request.email.as_deref() {
                            if email != current.email && repo.email_exists(email).await? {
                                return Err(DbError::AlreadyExists(format!(
                                    "email '{email}' already exists"
                                )));
                            }
                        }

                        let mut changes =
                            UserChanges::stamped(OffsetDateTime::now_utc(), updated_by);
                        changes.email = request.email;
                        changes.fullname = request.fullname;
                        changes.phone_number = request.phone_number;
                        changes.user_type = request.user_type;

                        repo.update_user_by_id(user_id, &changes).await
                    })
                }),
            )
            .await?;

        tracing::info!(user_id, "user updated");
        Ok(())
    }

    async fn transition_status(
        &self,
        caller: &AuthenticatedUser,
        request: UpdateStatusRequest,
    ) -> ApiResult<()> {
        let user_id = caller.user_id;
        let updated_by = caller.email.clone();
        let is_active = request.status;

        self.store
            .atomic(
                TxOptions::default(),
                Box::new(move |repo| {
                    Box::pin(async move {
                        // Non-blocking lock: status flips stay guarded but
                        // fail fast as a conflict instead of queueing behind
                        // a long-running full update.
                        repo.get_user_by_id(user_id, LockingOpt::for_update_no_wait())
                            .await?;

                        let change = StatusChange {
                            is_active,
                            updated_at: OffsetDateTime::now_utc(),
                            updated_by,
                        };
                        repo.update_user_status(user_id, &change).await
                    })
                }),
            )
            .await?;

        tracing::info!(user_id, is_active, "user status updated");
        Ok(())
    }
}
