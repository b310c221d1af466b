//! Transaction history queries
//!
//! Read-only retrieval of a participant's transfers, filtered by role and an
//! optional date range. Results come back ascending by timestamp, with both
//! participants projected to display-safe fields.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{Account, Participant, ParticipantRole, TransferView};
use crate::error::QueryError;
use crate::store::{AccountStore, TransactionStore};

/// Optional inclusive date bounds for a history query.
///
/// A missing start means "from the beginning of time"; a missing end means
/// "up to now" as seen by the service clock — an open-ended range never
/// includes future-dated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Concrete inclusive bounds: start-of-day to 23:59:59 of the end date.
    fn resolve(&self, clock: &dyn Clock) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .start
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::UNIX_EPOCH);

        let end = self
            .end
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc())
            .unwrap_or_else(|| clock.now());

        (start, end)
    }
}

/// Read-only access to a participant's transfer history.
pub struct QueryService {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            clock,
        }
    }

    /// Transfers where `participant` appears on either side.
    pub async fn list_all(
        &self,
        participant: &Account,
        range: DateRange,
    ) -> Result<Vec<TransferView>, QueryError> {
        self.list(participant, ParticipantRole::Either, range).await
    }

    /// Transfers `participant` originated.
    pub async fn list_as_payer(
        &self,
        participant: &Account,
        range: DateRange,
    ) -> Result<Vec<TransferView>, QueryError> {
        self.list(participant, ParticipantRole::Payer, range).await
    }

    /// Transfers `participant` received.
    pub async fn list_as_payee(
        &self,
        participant: &Account,
        range: DateRange,
    ) -> Result<Vec<TransferView>, QueryError> {
        self.list(participant, ParticipantRole::Payee, range).await
    }

    async fn list(
        &self,
        participant: &Account,
        role: ParticipantRole,
        range: DateRange,
    ) -> Result<Vec<TransferView>, QueryError> {
        let (start, end) = range.resolve(self.clock.as_ref());

        let mut records = self
            .transactions
            .find_by_participant(participant.id(), role, start, end)
            .await?;
        // the store contract already orders ascending; sorting again keeps
        // the guarantee independent of the adapter
        records.sort_by_key(|r| r.timestamp);

        let mut participants: HashMap<Uuid, Participant> =
            HashMap::from([(participant.id(), Participant::from(participant))]);

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let payer = self.project(&mut participants, record.payer_id).await?;
            let payee = self.project(&mut participants, record.payee_id).await?;
            views.push(TransferView {
                id: record.id,
                value: record.value,
                payer,
                payee,
                timestamp: record.timestamp,
            });
        }

        Ok(views)
    }

    async fn project(
        &self,
        cache: &mut HashMap<Uuid, Participant>,
        id: Uuid,
    ) -> Result<Participant, QueryError> {
        if let Some(participant) = cache.get(&id) {
            return Ok(participant.clone());
        }

        let account = self
            .accounts
            .get(id)
            .await?
            .ok_or(QueryError::UnknownParticipant(id))?;
        let participant = Participant::from(&account);
        cache.insert(id, participant.clone());
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    #[test]
    fn open_range_spans_epoch_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let clock = FixedClock::at(now);

        let (start, end) = DateRange::default().resolve(&clock);
        assert_eq!(start, DateTime::UNIX_EPOCH);
        assert_eq!(end, now);
    }

    #[test]
    fn bounds_are_start_of_day_and_end_of_day() {
        let clock = FixedClock::at(Utc::now());
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1),
            NaiveDate::from_ymd_opt(2024, 6, 30),
        );

        let (start, end) = range.resolve(&clock);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap());
    }

    #[test]
    fn missing_end_never_reaches_into_the_future() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let clock = FixedClock::at(now);
        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 6, 1), None);

        let (_, end) = range.resolve(&clock);
        assert_eq!(end, now);
    }
}
