use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id as text
    pub iat: usize,
    pub exp: usize,
}

/// Signing and verification keys derived once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str) -> anyhow::Result<String> {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, subject: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range for ttl {:?}", self.ttl))?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(subject, "jwt signed");
        Ok(token)
    }

    /// Returns the subject of a well-formed, correctly signed, unexpired token.
    /// Every failure collapses to `None`.
    pub fn decode(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(subject = %data.claims.sub, "jwt verified");
                Some(data.claims.sub)
            }
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            ttl_minutes,
        })
    }

    #[test]
    fn issue_then_decode_returns_subject() {
        let keys = make_keys("dev-secret", 30);
        for subject in ["1", "42", "9007199254740993"] {
            let token = keys.issue(subject).expect("sign");
            assert_eq!(keys.decode(&token).as_deref(), Some(subject));
        }
    }

    #[test]
    fn ttl_comes_from_config() {
        assert_eq!(make_keys("s", 30).ttl(), Duration::from_secs(1800));
        assert_eq!(make_keys("s", 1).ttl(), Duration::from_secs(60));
    }

    #[test]
    fn out_of_range_ttl_is_an_error_not_a_panic() {
        for ttl_minutes in [1_000_000_000_000, i64::MAX] {
            let keys = make_keys("dev-secret", ttl_minutes);
            assert!(keys.issue("1").is_err(), "ttl {ttl_minutes} should fail to sign");
        }
    }

    #[test]
    fn expired_token_decodes_to_none() {
        let keys = make_keys("dev-secret", 30);
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(31);
        let token = keys.issue_at("7", issued).expect("sign");
        assert_eq!(keys.decode(&token), None);
    }

    #[test]
    fn token_inside_ttl_is_still_valid() {
        let keys = make_keys("dev-secret", 30);
        let issued = OffsetDateTime::now_utc() - TimeDuration::minutes(29);
        let token = keys.issue_at("7", issued).expect("sign");
        assert_eq!(keys.decode(&token).as_deref(), Some("7"));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let ours = make_keys("secret-a", 30);
        let theirs = make_keys("secret-b", 30);
        let token = theirs.issue("1").expect("sign");
        assert_eq!(ours.decode(&token), None);
    }

    #[test]
    fn mangled_tokens_are_rejected() {
        let keys = make_keys("dev-secret", 30);
        let token = keys.issue("1").expect("sign");

        let (head, sig) = token.rsplit_once('.').unwrap();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        let bad_sig = format!("{head}.{flipped}{}", &sig[1..]);

        for bad in [bad_sig.as_str(), "not-a-token", "a.b.c", ""] {
            assert_eq!(keys.decode(bad), None, "{bad:?} should not decode");
        }
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let keys = make_keys("dev-secret", 30);
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: "1".into(),
            iat: now.unix_timestamp() as usize,
            exp: (now + TimeDuration::minutes(5)).unix_timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(keys.decode(&token), None);
    }
}
