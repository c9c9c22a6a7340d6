pub mod assignment;
pub mod comment;
pub mod status;
pub mod ticket;
pub mod user;
pub mod visibility;

use common::{
    context::GeneralContext,
    entities::{audit_log::AuditEntry, ticket::Ticket},
    error,
    repository::Repository,
};
use mongodb::bson::doc;

/// Writes the audit row, then applies the guarded ticket update. If the
/// update loses the optimistic race the audit row is deleted again, so a
/// committed mutation and its audit entry are observed together or not at
/// all.
pub(crate) async fn commit_with_audit(
    context: &GeneralContext,
    ticket: &Ticket,
    entry: AuditEntry,
) -> error::Result<Ticket> {
    let tickets = context.try_get_repository::<Ticket>()?;
    let audit_log = context.try_get_repository::<AuditEntry>()?;

    audit_log.insert(&entry).await?;

    match tickets.update_one(doc! {"id": ticket.id}, ticket).await {
        Ok(updated) => Ok(updated),
        Err(err) => {
            if let Err(rollback_err) = audit_log.delete("id", &entry.id).await {
                log::error!(
                    "Failed to roll back audit entry {}: {}",
                    entry.id,
                    rollback_err
                );
            }
            Err(err)
        }
    }
}
