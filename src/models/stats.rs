//! Booking statistics and analytics aggregates.
//!
//! Computed on demand from booking documents; nothing here is stored.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Booking, BookingStatus, BookingType, Court, Equipment, EquipmentIssue};

/// Per-user summary shown on the student dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserBookingStats {
    /// Pending or approved bookings
    pub active_bookings: u32,
    /// Items currently held (issued, not yet returned)
    pub equipment_issued: u32,
    /// Approved/completed hours starting this calendar month
    pub hours_this_month: f64,
    /// Late fees on returned items
    pub pending_fees: f64,
}

impl UserBookingStats {
    pub fn compute(bookings: &[Booking], issues: &[EquipmentIssue], now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();

        for booking in bookings {
            if booking.status.is_active() {
                stats.active_bookings += 1;
            }
            let counts_hours = matches!(
                booking.status,
                BookingStatus::Approved | BookingStatus::Completed
            );
            if counts_hours
                && booking.start_time.year() == now.year()
                && booking.start_time.month() == now.month()
            {
                stats.hours_this_month += booking.duration_hours();
            }
        }

        for issue in issues {
            if issue.is_outstanding() {
                stats.equipment_issued += issue.quantity;
            }
            stats.pending_fees += issue.delay_fee.unwrap_or(0.0);
        }

        stats
    }
}

/// Number of bookings for one court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CourtPopularity {
    pub court_id: String,
    pub name: String,
    pub bookings: u32,
}

/// Admin dashboard counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardStats {
    pub total_users: u32,
    pub active_classes: u32,
    pub total_courts: u32,
    pub equipment_issued: u32,
    pub low_stock_items: u32,
    pub pending_approvals: u32,
    /// Most booked first
    pub court_popularity: Vec<CourtPopularity>,
}

/// Counts the dashboard needs that come straight from collection sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardCounts {
    pub total_users: u32,
    pub active_classes: u32,
}

impl DashboardStats {
    pub fn compute(
        counts: DashboardCounts,
        courts: &[Court],
        equipment: &[Equipment],
        bookings: &[Booking],
        low_stock_threshold: u32,
    ) -> Self {
        let mut per_court: HashMap<&str, u32> = HashMap::new();
        let mut pending_approvals = 0;
        for booking in bookings {
            if booking.status == BookingStatus::Pending {
                pending_approvals += 1;
            }
            if let Some(court_id) = booking.court_id.as_deref() {
                *per_court.entry(court_id).or_insert(0) += 1;
            }
        }

        let mut court_popularity: Vec<CourtPopularity> = courts
            .iter()
            .map(|court| CourtPopularity {
                court_id: court.id.clone(),
                name: court.name.clone(),
                bookings: per_court.get(court.id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        court_popularity.sort_by(|a, b| b.bookings.cmp(&a.bookings).then(a.name.cmp(&b.name)));

        Self {
            total_users: counts.total_users,
            active_classes: counts.active_classes,
            total_courts: courts.len() as u32,
            equipment_issued: equipment.iter().map(Equipment::issued_quantity).sum(),
            low_stock_items: equipment
                .iter()
                .filter(|e| e.available_quantity < low_stock_threshold)
                .count() as u32,
            pending_approvals,
            court_popularity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SportUtilization {
    pub sport: String,
    pub bookings: u32,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyBookings {
    /// "YYYY-MM"
    pub month: String,
    pub individual: u32,
    pub class: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PeakHour {
    /// Start hour (UTC), 0-23
    pub hour: u32,
    pub bookings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EquipmentUsage {
    pub equipment_id: String,
    pub name: String,
    /// Items reserved by non-cancelled, non-rejected bookings
    pub quantity: u32,
}

/// Usage analytics over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Analytics {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_bookings: u32,
    pub average_duration_hours: f64,
    pub active_users: u32,
    /// Percent of open court-hours used by approved/completed bookings
    pub utilization_percent: f64,
    pub court_utilization: Vec<SportUtilization>,
    pub monthly_bookings: Vec<MonthlyBookings>,
    pub peak_hours: Vec<PeakHour>,
    pub equipment_usage: Vec<EquipmentUsage>,
}

/// Inputs for [`Analytics::compute`].
pub struct AnalyticsInput<'a> {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Bookings starting inside `[from, to)`
    pub bookings: &'a [Booking],
    pub courts: &'a [Court],
    pub equipment: &'a [Equipment],
    /// Hours per day the facilities are open
    pub open_hours_per_day: f64,
}

fn is_used(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Approved | BookingStatus::Completed)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Analytics {
    pub fn compute(input: AnalyticsInput<'_>) -> Self {
        let bookings: Vec<&Booking> = input
            .bookings
            .iter()
            .filter(|b| b.start_time >= input.from && b.start_time < input.to)
            .collect();

        let total_bookings = bookings.len() as u32;
        let average_duration_hours = if bookings.is_empty() {
            0.0
        } else {
            round1(bookings.iter().map(|b| b.duration_hours()).sum::<f64>() / bookings.len() as f64)
        };
        let active_users = bookings
            .iter()
            .map(|b| b.user_id.as_str())
            .collect::<HashSet<_>>()
            .len() as u32;

        // Court utilization
        let sport_of: HashMap<&str, &str> = input
            .courts
            .iter()
            .map(|c| (c.id.as_str(), c.sport.as_str()))
            .collect();
        let mut by_sport: BTreeMap<&str, (u32, f64)> = BTreeMap::new();
        let mut used_court_hours = 0.0;
        for booking in &bookings {
            let Some(sport) = booking
                .court_id
                .as_deref()
                .and_then(|id| sport_of.get(id).copied())
            else {
                continue;
            };
            let entry = by_sport.entry(sport).or_insert((0, 0.0));
            entry.0 += 1;
            if is_used(booking.status) {
                entry.1 += booking.duration_hours();
                used_court_hours += booking.duration_hours();
            }
        }
        let court_utilization = by_sport
            .into_iter()
            .map(|(sport, (bookings, hours))| SportUtilization {
                sport: sport.to_string(),
                bookings,
                hours: round1(hours),
            })
            .collect();

        let window_days = (input.to - input.from).num_seconds() as f64 / 86_400.0;
        let capacity_hours = window_days * input.open_hours_per_day * input.courts.len() as f64;
        let utilization_percent = if capacity_hours > 0.0 {
            round1((used_court_hours / capacity_hours * 100.0).min(100.0))
        } else {
            0.0
        };

        // Time series
        let mut months: BTreeMap<String, (u32, u32)> = BTreeMap::new();
        let mut hours: BTreeMap<u32, u32> = BTreeMap::new();
        for booking in &bookings {
            let key = booking.start_time.format("%Y-%m").to_string();
            let entry = months.entry(key).or_insert((0, 0));
            match booking.booking_type {
                BookingType::Individual => entry.0 += 1,
                BookingType::Class => entry.1 += 1,
            }
            *hours.entry(booking.start_time.hour()).or_insert(0) += 1;
        }
        let monthly_bookings = months
            .into_iter()
            .map(|(month, (individual, class))| MonthlyBookings {
                month,
                individual,
                class,
            })
            .collect();
        let peak_hours = hours
            .into_iter()
            .map(|(hour, bookings)| PeakHour { hour, bookings })
            .collect();

        // Equipment usage
        let mut reserved: HashMap<&str, u32> = HashMap::new();
        for booking in &bookings {
            if matches!(
                booking.status,
                BookingStatus::Rejected | BookingStatus::Cancelled
            ) {
                continue;
            }
            if let Some(equipment_id) = booking.equipment_id.as_deref() {
                *reserved.entry(equipment_id).or_insert(0) += booking.quantity.unwrap_or(1);
            }
        }
        let mut equipment_usage: Vec<EquipmentUsage> = input
            .equipment
            .iter()
            .map(|e| EquipmentUsage {
                equipment_id: e.id.clone(),
                name: e.name.clone(),
                quantity: reserved.get(e.id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        equipment_usage.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.name.cmp(&b.name)));

        Self {
            from: input.from,
            to: input.to,
            total_bookings,
            average_duration_hours,
            active_users,
            utilization_percent,
            court_utilization,
            monthly_bookings,
            peak_hours,
            equipment_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentCondition, ResourceType};
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn court(id: &str, sport: &str) -> Court {
        Court {
            id: id.to_string(),
            name: format!("{sport} court {id}"),
            sport: sport.to_string(),
            location: "Sports Complex".to_string(),
            capacity: 10,
            image_url: None,
            amenities: vec![],
            is_available: true,
            created_at: at(1, 0),
            updated_at: at(1, 0),
        }
    }

    fn equipment(id: &str, total: u32, available: u32) -> Equipment {
        Equipment {
            id: id.to_string(),
            name: format!("Item {id}"),
            category: "General".to_string(),
            total_quantity: total,
            available_quantity: available,
            condition: EquipmentCondition::Good,
            image_url: None,
            last_restocked: None,
            created_at: at(1, 0),
            updated_at: at(1, 0),
        }
    }

    fn court_booking(
        user: &str,
        court_id: &str,
        start: DateTime<Utc>,
        hours: i64,
        status: BookingStatus,
        booking_type: BookingType,
    ) -> Booking {
        Booking {
            id: format!("b-{user}-{}", start.timestamp()),
            user_id: user.to_string(),
            class_id: None,
            court_id: Some(court_id.to_string()),
            equipment_id: None,
            resource_type: ResourceType::Court,
            booking_type,
            quantity: None,
            start_time: start,
            end_time: start + Duration::hours(hours),
            status,
            notes: None,
            created_at: start,
            updated_at: start,
        }
    }

    fn equipment_booking(equipment_id: &str, quantity: u32, status: BookingStatus) -> Booking {
        Booking {
            id: format!("eb-{equipment_id}-{quantity}"),
            user_id: "u-eq".to_string(),
            class_id: None,
            court_id: None,
            equipment_id: Some(equipment_id.to_string()),
            resource_type: ResourceType::Equipment,
            booking_type: BookingType::Individual,
            quantity: Some(quantity),
            start_time: at(12, 14),
            end_time: at(12, 16),
            status,
            notes: None,
            created_at: at(12, 14),
            updated_at: at(12, 14),
        }
    }

    #[test]
    fn test_user_stats() {
        let now = at(20, 12);
        let bookings = vec![
            court_booking("u1", "c1", at(5, 9), 2, BookingStatus::Completed, BookingType::Individual),
            court_booking("u1", "c1", at(21, 9), 1, BookingStatus::Approved, BookingType::Individual),
            court_booking("u1", "c1", at(22, 9), 1, BookingStatus::Pending, BookingType::Individual),
            court_booking("u1", "c1", at(6, 9), 3, BookingStatus::Rejected, BookingType::Individual),
            court_booking(
                "u1",
                "c1",
                Utc.with_ymd_and_hms(2025, 12, 30, 9, 0, 0).unwrap(),
                4,
                BookingStatus::Completed,
                BookingType::Individual,
            ),
        ];
        let issues = vec![
            EquipmentIssue {
                id: "i1".to_string(),
                booking_id: "b1".to_string(),
                equipment_id: "e1".to_string(),
                user_id: "u1".to_string(),
                quantity: 2,
                issued_at: at(19, 10),
                due_at: at(19, 12),
                returned_at: None,
                return_condition: None,
                delay_fee: None,
                notes: None,
            },
            EquipmentIssue {
                id: "i2".to_string(),
                booking_id: "b2".to_string(),
                equipment_id: "e1".to_string(),
                user_id: "u1".to_string(),
                quantity: 1,
                issued_at: at(10, 10),
                due_at: at(10, 12),
                returned_at: Some(at(10, 15)),
                return_condition: None,
                delay_fee: Some(30.0),
                notes: None,
            },
        ];

        let stats = UserBookingStats::compute(&bookings, &issues, now);
        assert_eq!(stats.active_bookings, 2);
        assert_eq!(stats.equipment_issued, 2);
        assert_eq!(stats.hours_this_month, 3.0);
        assert_eq!(stats.pending_fees, 30.0);
    }

    #[test]
    fn test_dashboard_stats() {
        let courts = vec![court("c1", "Basketball"), court("c2", "Tennis")];
        let equipment = vec![equipment("e1", 10, 2), equipment("e2", 5, 5)];
        let bookings = vec![
            court_booking("u1", "c2", at(5, 9), 1, BookingStatus::Pending, BookingType::Individual),
            court_booking("u2", "c2", at(6, 9), 1, BookingStatus::Approved, BookingType::Class),
            court_booking("u3", "c1", at(7, 9), 1, BookingStatus::Pending, BookingType::Individual),
        ];

        let stats = DashboardStats::compute(
            DashboardCounts {
                total_users: 12,
                active_classes: 3,
            },
            &courts,
            &equipment,
            &bookings,
            3,
        );

        assert_eq!(stats.total_users, 12);
        assert_eq!(stats.active_classes, 3);
        assert_eq!(stats.total_courts, 2);
        assert_eq!(stats.equipment_issued, 8);
        assert_eq!(stats.low_stock_items, 1);
        assert_eq!(stats.pending_approvals, 2);
        assert_eq!(stats.court_popularity[0].court_id, "c2");
        assert_eq!(stats.court_popularity[0].bookings, 2);
        assert_eq!(stats.court_popularity[1].bookings, 1);
    }

    #[test]
    fn test_analytics() {
        let from = at(1, 0);
        let to = at(11, 0);
        let courts = vec![court("c1", "Basketball"), court("c2", "Tennis")];
        let equipment = vec![equipment("e1", 10, 10), equipment("e2", 4, 4)];
        let bookings = vec![
            court_booking("u1", "c1", at(2, 9), 2, BookingStatus::Completed, BookingType::Class),
            court_booking("u2", "c1", at(3, 9), 1, BookingStatus::Approved, BookingType::Individual),
            court_booking("u2", "c2", at(3, 17), 1, BookingStatus::Rejected, BookingType::Individual),
            // Outside the window
            court_booking("u9", "c2", at(15, 9), 5, BookingStatus::Approved, BookingType::Individual),
        ];
        let mut all = bookings.clone();
        all.push(equipment_booking("e2", 3, BookingStatus::Approved));
        all.push(equipment_booking("e1", 7, BookingStatus::Cancelled));
        // Equipment bookings in the fixture start on the 12th; shift them into the window.
        for b in all.iter_mut().filter(|b| b.equipment_id.is_some()) {
            b.start_time = at(4, 14);
            b.end_time = at(4, 16);
        }

        let analytics = Analytics::compute(AnalyticsInput {
            from,
            to,
            bookings: &all,
            courts: &courts,
            equipment: &equipment,
            open_hours_per_day: 15.0,
        });

        assert_eq!(analytics.total_bookings, 5);
        assert_eq!(analytics.active_users, 3);
        // (2 + 1 + 1 + 2 + 2) / 5
        assert_eq!(analytics.average_duration_hours, 1.6);
        // 3 used hours of 10 days * 15 h * 2 courts
        assert_eq!(analytics.utilization_percent, 1.0);

        assert_eq!(analytics.court_utilization.len(), 2);
        assert_eq!(analytics.court_utilization[0].sport, "Basketball");
        assert_eq!(analytics.court_utilization[0].bookings, 2);
        assert_eq!(analytics.court_utilization[0].hours, 3.0);
        assert_eq!(analytics.court_utilization[1].sport, "Tennis");
        assert_eq!(analytics.court_utilization[1].hours, 0.0);

        assert_eq!(analytics.monthly_bookings.len(), 1);
        assert_eq!(analytics.monthly_bookings[0].month, "2026-01");
        assert_eq!(analytics.monthly_bookings[0].individual, 4);
        assert_eq!(analytics.monthly_bookings[0].class, 1);

        let nine = analytics.peak_hours.iter().find(|p| p.hour == 9).unwrap();
        assert_eq!(nine.bookings, 2);

        assert_eq!(analytics.equipment_usage[0].equipment_id, "e2");
        assert_eq!(analytics.equipment_usage[0].quantity, 3);
        assert_eq!(analytics.equipment_usage[1].quantity, 0);
    }

    #[test]
    fn test_analytics_empty() {
        let analytics = Analytics::compute(AnalyticsInput {
            from: at(1, 0),
            to: at(2, 0),
            bookings: &[],
            courts: &[],
            equipment: &[],
            open_hours_per_day: 15.0,
        });
        assert_eq!(analytics.total_bookings, 0);
        assert_eq!(analytics.average_duration_hours, 0.0);
        assert_eq!(analytics.utilization_percent, 0.0);
        assert!(analytics.peak_hours.is_empty());
    }
}
