use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{
    context::GeneralContext,
    services::{NOTIFICATIONS_SERVICE, PROTOCOL},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: String,
    pub subject: String,
    pub message: String,
    pub links: Vec<String>,
}

impl NewNotification {
    pub fn new(user_id: ObjectId, subject: String, message: String) -> Self {
        Self {
            user_id: user_id.to_hex(),
            subject,
            message,
            links: Vec::new(),
        }
    }
}

/// Dispatches a notification without waiting for it. The caller's response
/// never depends on the notification service; failures are logged only.
pub fn notify(context: &GeneralContext, notification: NewNotification) {
    let GeneralContext::Effectfull(context) = context else {
        return;
    };

    let client = context.0.client.clone();
    let token = match context.server_auth().to_token() {
        Ok(token) => token,
        Err(err) => {
            log::error!("Failed to sign notification request: {}", err);
            return;
        }
    };

    actix_web::rt::spawn(async move {
        let result = client
            .post(format!(
                "{}://{}/api/send_notification",
                PROTOCOL.as_str(),
                NOTIFICATIONS_SERVICE.as_str()
            ))
            .header("Authorization", format!("Bearer {}", token))
            .json(&notification)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                log::error!("Notification rejected: {}", response.status());
            }
            Err(err) => {
                log::error!("Failed to send notification: {}", err);
            }
            _ => {}
        }
    });
}
