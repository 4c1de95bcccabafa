//! Channel address normalization.
//!
//! The gateway delivers WhatsApp addresses as `whatsapp:+447305671889`. Lookups
//! against the telecom table use the bare number, so the transport scheme is
//! stripped before routing.

/// Scheme used by the gateway for WhatsApp addresses.
pub const DEFAULT_SCHEME: &str = "whatsapp";

/// Strips a transport-scheme prefix (`<scheme>:`) from channel addresses.
///
/// Repeated prefixes are removed together, so normalizing an already
/// normalized address returns it unchanged.
#[derive(Debug, Clone)]
pub struct AddressNormalizer {
    prefix: String,
}

impl AddressNormalizer {
    pub fn new(scheme: &str) -> Self {
        Self {
            prefix: format!("{}:", scheme),
        }
    }

    /// Remove the scheme prefix, leaving unprefixed numbers untouched.
    pub fn normalize(&self, address: &str) -> String {
        let mut rest = address;
        while let Some(stripped) = rest.strip_prefix(self.prefix.as_str()) {
            rest = stripped;
        }
        rest.to_string()
    }
}

impl Default for AddressNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scheme_prefix() {
        let normalizer = AddressNormalizer::default();
        assert_eq!(normalizer.normalize("whatsapp:+447305671889"), "+447305671889");
    }

    #[test]
    fn test_unprefixed_number_is_unchanged() {
        let normalizer = AddressNormalizer::default();
        assert_eq!(normalizer.normalize("+447367184030"), "+447367184030");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = AddressNormalizer::default();

        for input in ["whatsapp:+1555", "+1555", "whatsapp:whatsapp:+1555", "", "whatsapp:"] {
            let once = normalizer.normalize(input);
            let twice = normalizer.normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_scheme_only_stripped_at_start() {
        let normalizer = AddressNormalizer::default();
        assert_eq!(normalizer.normalize("+1555whatsapp:"), "+1555whatsapp:");
    }

    #[test]
    fn test_custom_scheme() {
        let normalizer = AddressNormalizer::new("channel");
        assert_eq!(normalizer.normalize("channel:+1777"), "+1777");
        assert_eq!(normalizer.normalize("whatsapp:+1777"), "whatsapp:+1777");
    }
}
