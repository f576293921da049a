/// Credential extraction from request headers
///
/// Pure parsing of the `Authorization` header. No I/O.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_SCHEME: &str = "Bearer ";
const API_KEY_SCHEME: &str = "ApiKey ";

fn authorization_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let credential = value
        .strip_prefix(scheme)
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if credential.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(credential)
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, BEARER_SCHEME)
}

/// `Authorization: ApiKey <key>`, used by the payment provider webhook
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, API_KEY_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_is_trimmed() {
        let headers = headers("Bearer   abc.def.ghi  ");
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(api_key(&HeaderMap::new()), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&headers("ApiKey abc")), Err(AuthError::MissingToken));
        assert_eq!(api_key(&headers("Bearer abc")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_empty_credential() {
        assert_eq!(bearer_token(&headers("Bearer ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_api_key() {
        assert_eq!(api_key(&headers("ApiKey f271c81ff7084ee5b99a5091b42d486e")),
            Ok("f271c81ff7084ee5b99a5091b42d486e"));
    }
}
