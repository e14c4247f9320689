//! Remote token checks used by the guard.

use crate::{
    api::{auth::TokenEndpoints, types::TokenPair},
    errors::AppError,
};
use std::{future::Future, pin::Pin};

pub trait TokenVerifier: Send + Sync {
    /// `Ok(false)` means the API rejected the token; `Err` means it could not
    /// be asked.
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + 'a>>;

    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenPair, AppError>> + Send + 'a>>;
}

impl TokenVerifier for TokenEndpoints {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, AppError>> + Send + 'a>> {
        Box::pin(TokenEndpoints::verify(self, token))
    }

    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenPair, AppError>> + Send + 'a>> {
        Box::pin(self.refresh_pair(refresh_token))
    }
}
