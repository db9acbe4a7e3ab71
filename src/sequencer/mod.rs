//! Per-company booking sequences.
//!
//! Partitions bookings by company, orders each partition by time, and
//! derives the previous booking, the gap to it, and the next shipment type.

use crate::models::{Booking, GapRecord, TransitionPair};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::debug;

/// A booking placed within its company's time-ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedBooking {
    pub company_name: String,
    pub booking_date: NaiveDateTime,
    pub shipment_type: String,
    pub prev_booking_date: Option<NaiveDateTime>,
    pub days_gap: Option<i64>,
    pub next_shipment_type: Option<String>,
}

impl SequencedBooking {
    /// The gap view of this booking.
    pub fn gap_record(&self) -> GapRecord {
        GapRecord {
            company_name: self.company_name.clone(),
            booking_date: self.booking_date,
            prev_booking_date: self.prev_booking_date,
            days_gap: self.days_gap,
        }
    }

    /// The transition out of this booking, unless it is the company's last.
    pub fn transition(&self) -> Option<TransitionPair> {
        self.next_shipment_type
            .as_ref()
            .map(|next| TransitionPair {
                current_type: self.shipment_type.clone(),
                next_type: next.clone(),
            })
    }
}

/// All bookings ordered by company name, then by time within each company.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    records: Vec<SequencedBooking>,
}

impl Sequence {
    /// Records in sequence order.
    pub fn records(&self) -> &[SequencedBooking] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct company names in ascending order.
    pub fn companies(&self) -> Vec<&str> {
        let mut companies: Vec<&str> = self
            .records
            .iter()
            .map(|r| r.company_name.as_str())
            .collect();
        companies.dedup();
        companies
    }

    /// One company's records in time order.
    pub fn company_records(&self, company: &str) -> &[SequencedBooking] {
        let start = self
            .records
            .partition_point(|r| r.company_name.as_str() < company);
        let end = self
            .records
            .partition_point(|r| r.company_name.as_str() <= company);
        &self.records[start..end]
    }

    /// One gap record per booking.
    pub fn gap_records(&self) -> Vec<GapRecord> {
        self.records.iter().map(SequencedBooking::gap_record).collect()
    }

    /// Consecutive shipment-type pairs across all companies.
    pub fn transition_pairs(&self) -> Vec<TransitionPair> {
        self.records
            .iter()
            .filter_map(SequencedBooking::transition)
            .collect()
    }
}

/// Order bookings per company and derive gaps and next shipment types.
///
/// Ties on the booking date keep their input order.
pub fn sequence(bookings: &[Booking]) -> Sequence {
    let mut partitions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, booking) in bookings.iter().enumerate() {
        partitions
            .entry(booking.company_name.as_str())
            .or_default()
            .push(i);
    }

    let mut records = Vec::with_capacity(bookings.len());

    for (company, mut indices) in partitions {
        // sort_by_key is stable
        indices.sort_by_key(|&i| bookings[i].booking_date);

        for (pos, &i) in indices.iter().enumerate() {
            let booking = &bookings[i];
            let prev_booking_date = pos
                .checked_sub(1)
                .map(|p| bookings[indices[p]].booking_date);
            let next_shipment_type = indices
                .get(pos + 1)
                .map(|&n| bookings[n].shipment_type.clone());

            records.push(SequencedBooking {
                company_name: company.to_string(),
                booking_date: booking.booking_date,
                shipment_type: booking.shipment_type.clone(),
                prev_booking_date,
                days_gap: prev_booking_date.map(|prev| (booking.booking_date - prev).num_days()),
                next_shipment_type,
            });
        }
    }

    debug!("Sequenced {} bookings", records.len());
    Sequence { records }
}
