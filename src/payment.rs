//! Seam for the external payment provider. The provider's API is not this
//! crate's concern; checkout only needs to know whether a hosted checkout
//! page exists for an order, and status verification happens out-of-band
//! against the order id the caller brings back.

use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Redirect the customer to an external checkout page.
    Provider { checkout_url: String },
    /// No provider configured: the demo confirm-mock flow applies.
    Mock,
}

/// Resolve the checkout mode for a freshly created order.
pub fn checkout_mode(config: &AppConfig, order_id: Uuid) -> CheckoutMode {
    match config.payment_checkout_url.as_deref() {
        Some(base) => CheckoutMode::Provider {
            checkout_url: format!("{}?order_id={order_id}", base.trim_end_matches('/')),
        },
        None => CheckoutMode::Mock,
    }
}

/// Whether the mock confirmation escape hatch is available. It is disabled
/// as soon as a real provider is configured.
pub fn mock_enabled(config: &AppConfig) -> bool {
    config.payment_checkout_url.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            payment_checkout_url: url.map(String::from),
        }
    }

    #[test]
    fn falls_back_to_mock_without_provider() {
        let id = Uuid::new_v4();
        assert_eq!(checkout_mode(&config(None), id), CheckoutMode::Mock);
        assert!(mock_enabled(&config(None)));
    }

    #[test]
    fn builds_provider_redirect() {
        let id = Uuid::new_v4();
        let mode = checkout_mode(&config(Some("https://pay.example.com/session/")), id);
        assert_eq!(
            mode,
            CheckoutMode::Provider {
                checkout_url: format!("https://pay.example.com/session?order_id={id}"),
            }
        );
        assert!(!mock_enabled(&config(Some("https://pay.example.com"))));
    }
}
