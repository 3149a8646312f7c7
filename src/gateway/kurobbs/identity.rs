use sha2::{Digest, Sha256};

/// Length of the `devcode` header value.
pub const DEVICE_CODE_LEN: usize = 40;

const MAX_DEVICE_CODE_LEN: usize = 64;

/// Deterministic device fingerprint presented for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_code: String,
    pub ip: String,
}

impl DeviceIdentity {
    pub fn for_uid(uid: &str) -> Self {
        Self {
            device_code: device_code(uid, DEVICE_CODE_LEN),
            ip: synthetic_ip(uid),
        }
    }
}

/// Uppercase hex SHA-256 of `input`, truncated to `length` characters.
///
/// Lengths above 64 are clamped; an empty input hashes as `"1"`.
pub fn device_code(input: &str, length: usize) -> String {
    let input = if input.is_empty() {
        tracing::warn!("Empty device code seed, falling back to \"1\"");
        "1"
    } else {
        input
    };

    let length = if length > MAX_DEVICE_CODE_LEN {
        tracing::warn!(
            requested = length,
            "Device code length exceeds {MAX_DEVICE_CODE_LEN}, clamping"
        );
        MAX_DEVICE_CODE_LEN
    } else {
        length
    };

    let digest = hex::encode_upper(Sha256::digest(input.as_bytes()));
    let code = digest[..length].to_string();
    tracing::debug!(seed = input, length, code = %code, "Generated device code");
    code
}

/// Emulator-style LAN address derived from the last two characters of the uid.
pub fn synthetic_ip(uid: &str) -> String {
    let chars: Vec<char> = uid.chars().collect();
    let suffix: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    format!("10.0.2.2{suffix}")
}
