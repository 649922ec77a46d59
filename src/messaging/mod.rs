//! Outbound messaging boundary.
//!
//! SMS and email go through configured HTTP gateways; WhatsApp is a link the
//! operator opens themselves. Gateway failures are converted to a structured
//! error at this boundary and never propagate as an unhandled fault.

use reqwest::Client;

use crate::config::Config;
use crate::errors::AppError;

/// Send an SMS through the configured gateway.
pub async fn send_sms(
    client: &Client,
    config: &Config,
    to: &str,
    message: &str,
) -> Result<(), AppError> {
    let url = config
        .sms_gateway_url
        .as_ref()
        .ok_or_else(|| AppError::Gateway("SMS gateway is not configured".to_string()))?;

    let mut request = client.post(url).json(&serde_json::json!({
        "to": to,
        "message": message,
    }));
    if let Some(key) = &config.sms_api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        tracing::error!("SMS gateway returned {}", response.status());
        return Err(AppError::Gateway(format!(
            "SMS gateway returned {}",
            response.status()
        )));
    }

    tracing::info!("SMS sent to {}", to);
    Ok(())
}

/// Send an email through the configured gateway.
pub async fn send_email(
    client: &Client,
    config: &Config,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), AppError> {
    let url = config
        .email_gateway_url
        .as_ref()
        .ok_or_else(|| AppError::Gateway("Email gateway is not configured".to_string()))?;

    let mut request = client.post(url).json(&serde_json::json!({
        "to": to,
        "subject": subject,
        "body": body,
    }));
    if let Some(key) = &config.email_api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        tracing::error!("Email gateway returned {}", response.status());
        return Err(AppError::Gateway(format!(
            "Email gateway returned {}",
            response.status()
        )));
    }

    tracing::info!("Email sent to {}", to);
    Ok(())
}

/// Build a wa.me link for a phone number. The number must already be
/// normalized to digits and an optional leading '+'.
pub fn whatsapp_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if text.is_empty() {
        format!("https://wa.me/{}", digits)
    } else {
        format!("https://wa.me/{}?text={}", digits, urlencoding::encode(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link_strips_plus() {
        assert_eq!(
            whatsapp_link("+233551234567", ""),
            "https://wa.me/233551234567"
        );
    }

    #[test]
    fn test_whatsapp_link_encodes_text() {
        assert_eq!(
            whatsapp_link("0551234567", "Hello there"),
            "https://wa.me/0551234567?text=Hello%20there"
        );
    }
}
