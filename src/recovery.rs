use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Namespace prefix mixed into every recovery token so the signature cannot
/// be replayed for another purpose.
const RECOVERY_NAMESPACE: &str = "recover_cart_";

/// Deterministic recovery token for a cart: the same cart always yields the
/// same token, and the token cannot be forged without the site secret.
pub fn recovery_token(site_secret: &str, cart_id: Uuid) -> String {
    let mut mac = HmacSha256::new_from_slice(site_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(RECOVERY_NAMESPACE.as_bytes());
    mac.update(cart_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checkout deep link that resumes the cart without requiring a login.
pub fn checkout_url(storefront_url: &str, cart_id: Uuid, token: &str) -> String {
    let base = storefront_url.trim_end_matches('/');
    format!("{base}/order?step=3&recover_cart={cart_id}&token_cart={token}")
}
