//! Custom-domain verification for the Settings screen.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use thiserror::Error;
use tokio::net::lookup_host;

use cohort_types::{DomainCheckResult, DomainStatus};

const MAX_DOMAIN_LEN: usize = 253;

static DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("Failed to compile domain regex")
});

#[derive(Debug, Error)]
pub enum DomainCheckError {
    #[error("'{0}' is not a valid domain name")]
    InvalidDomain(String),
    #[error("failed to build HTTPS client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Normalize and validate a domain name: trimmed, lowercase, no trailing dot.
pub fn validate_domain(input: &str) -> Result<String, DomainCheckError> {
    let domain = input.trim().trim_end_matches('.').to_lowercase();
    if domain.len() > MAX_DOMAIN_LEN || !DOMAIN_REGEX.is_match(&domain) {
        return Err(DomainCheckError::InvalidDomain(input.trim().to_string()));
    }
    Ok(domain)
}

#[async_trait]
pub trait DomainChecker: Send + Sync {
    /// Check a domain that already passed [`validate_domain`]
    async fn check(&self, domain: &str) -> Result<DomainCheckResult, DomainCheckError>;
}

fn result_for(domain: &str, status: DomainStatus) -> DomainCheckResult {
    let (dns_configured, ssl_active, message) = match status {
        DomainStatus::Connected => (true, true, "Domain is connected and SSL is active."),
        DomainStatus::DnsPending => (
            false,
            false,
            "DNS records not found yet. Changes can take up to 48 hours to propagate.",
        ),
        DomainStatus::SslPending => (
            true,
            false,
            "DNS is configured. The SSL certificate is still being provisioned.",
        ),
        DomainStatus::Unreachable => (true, false, "DNS resolves but the site did not respond over HTTPS."),
    };

    DomainCheckResult {
        domain: domain.to_string(),
        status,
        dns_configured,
        ssl_active,
        message: message.to_string(),
    }
}

/// Demo checker: waits, then reports one of three canned outcomes at random.
pub struct SimulatedDomainChecker {
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedDomainChecker {
    const OUTCOMES: [DomainStatus; 3] = [
        DomainStatus::Connected,
        DomainStatus::DnsPending,
        DomainStatus::SslPending,
    ];

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(delay: Duration, seed: u64) -> Self {
        Self {
            delay,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self) -> DomainStatus {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self::OUTCOMES[rng.gen_range(0..Self::OUTCOMES.len())]
    }
}

#[async_trait]
impl DomainChecker for SimulatedDomainChecker {
    async fn check(&self, domain: &str) -> Result<DomainCheckResult, DomainCheckError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let status = self.pick();
        tracing::debug!("Simulated domain check for {}: {}", domain, status.as_str());
        Ok(result_for(domain, status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Ok,
    TimedOut,
    Failed,
}

/// Checker that resolves the domain and probes it over HTTPS.
pub struct ResolvingDomainChecker {
    client: reqwest::Client,
    attempts: u32,
    initial_backoff: Duration,
    attempt_timeout: Duration,
}

impl ResolvingDomainChecker {
    pub fn new(attempts: u32, initial_backoff: Duration, attempt_timeout: Duration) -> Result<Self, DomainCheckError> {
        let client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()?;

        Ok(Self {
            client,
            attempts: attempts.max(1),
            initial_backoff,
            attempt_timeout,
        })
    }

    async fn resolves(&self, domain: &str) -> bool {
        let mut backoff = self.initial_backoff;

        for attempt in 1..=self.attempts {
            match tokio::time::timeout(self.attempt_timeout, lookup_host((domain, 443))).await {
                Ok(Ok(mut addrs)) => {
                    if addrs.next().is_some() {
                        return true;
                    }
                    tracing::debug!("{} resolved to no addresses (attempt {})", domain, attempt);
                }
                Ok(Err(e)) => tracing::debug!("DNS lookup for {} failed (attempt {}): {}", domain, attempt, e),
                Err(_) => tracing::debug!("DNS lookup for {} timed out (attempt {})", domain, attempt),
            }

            if attempt < self.attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        false
    }

    async fn probe(&self, domain: &str) -> Probe {
        match self.client.head(format!("https://{}/", domain)).send().await {
            Ok(_) => Probe::Ok,
            Err(e) if e.is_timeout() => Probe::TimedOut,
            Err(e) => {
                tracing::debug!("HTTPS probe of {} failed: {}", domain, e);
                Probe::Failed
            }
        }
    }

    fn classify(resolved: bool, probe: Option<Probe>) -> DomainStatus {
        match (resolved, probe) {
            (false, _) => DomainStatus::DnsPending,
            (true, Some(Probe::Ok)) => DomainStatus::Connected,
            (true, Some(Probe::TimedOut)) => DomainStatus::Unreachable,
            (true, _) => DomainStatus::SslPending,
        }
    }
}

#[async_trait]
impl DomainChecker for ResolvingDomainChecker {
    async fn check(&self, domain: &str) -> Result<DomainCheckResult, DomainCheckError> {
        let resolved = self.resolves(domain).await;
        let probe = if resolved { Some(self.probe(domain).await) } else { None };
        let status = Self::classify(resolved, probe);
        tracing::info!("Domain check for {}: {}", domain, status.as_str());
        Ok(result_for(domain, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain() {
        assert_eq!(validate_domain(" Academy.Example.com. ").unwrap(), "academy.example.com");
        assert_eq!(validate_domain("my-school.io").unwrap(), "my-school.io");

        for bad in ["", "localhost", "-bad.com", "bad-.com", "exa mple.com", "https://example.com", "example.c"] {
            assert!(
                matches!(validate_domain(bad), Err(DomainCheckError::InvalidDomain(_))),
                "{} should be rejected",
                bad
            );
        }

        let long = format!("{}.com", "a.".repeat(130));
        assert!(validate_domain(&long).is_err());
    }

    #[tokio::test]
    async fn test_simulated_returns_canned_result() {
        let checker = SimulatedDomainChecker::with_seed(Duration::ZERO, 7);
        for _ in 0..20 {
            let result = checker.check("academy.example.com").await.unwrap();
            assert_eq!(result.domain, "academy.example.com");
            assert_ne!(result.status, DomainStatus::Unreachable);
            assert_eq!(result.ssl_active, result.status == DomainStatus::Connected);
            assert_eq!(result.dns_configured, result.status != DomainStatus::DnsPending);
        }
    }

    #[tokio::test]
    async fn test_simulated_is_reproducible_with_seed() {
        let a = SimulatedDomainChecker::with_seed(Duration::ZERO, 42);
        let b = SimulatedDomainChecker::with_seed(Duration::ZERO, 42);
        for _ in 0..10 {
            assert_eq!(
                a.check("a.example.com").await.unwrap().status,
                b.check("a.example.com").await.unwrap().status
            );
        }
    }

    #[tokio::test]
    async fn test_simulated_waits_for_delay() {
        let checker = SimulatedDomainChecker::with_seed(Duration::from_millis(50), 1);
        let started = std::time::Instant::now();
        checker.check("example.com").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_resolving_classification() {
        assert_eq!(ResolvingDomainChecker::classify(false, None), DomainStatus::DnsPending);
        assert_eq!(ResolvingDomainChecker::classify(true, Some(Probe::Ok)), DomainStatus::Connected);
        assert_eq!(ResolvingDomainChecker::classify(true, Some(Probe::Failed)), DomainStatus::SslPending);
        assert_eq!(
            ResolvingDomainChecker::classify(true, Some(Probe::TimedOut)),
            DomainStatus::Unreachable
        );
    }

    #[tokio::test]
    async fn test_resolving_reserved_tld_is_not_connected() {
        let checker =
            ResolvingDomainChecker::new(2, Duration::from_millis(10), Duration::from_millis(500)).unwrap();
        let result = checker.check("cohort-check.invalid").await.unwrap();
        assert_ne!(result.status, DomainStatus::Connected);
    }
}
