use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Derive the record token for a player.
///
/// `hex(HMAC-SHA1(key = secret, player_id ‖ player_token))`, lowercase.
/// The two inputs are fed as separate updates with no delimiter, so only
/// their concatenation matters.
pub fn derive_token(
    secret: &str,
    player_id: &str,
    player_token: &str,
) -> Result<String, InvalidLength> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret.as_bytes())?;
    mac.update(player_id.as_bytes());
    mac.update(player_token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
