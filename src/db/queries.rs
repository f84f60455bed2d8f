use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::fare::round_money;
use crate::models::{Booking, BookingStatus, Driver, DriverStatus, TrafficLevel, Vehicle};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, customer_name, email, phone, pickup_location, dropoff_location, \
     pickup_datetime, passengers, flight_number, notes, distance_miles, duration_minutes, \
     base_fare, airport_fee, time_fee, passenger_fee, surge_multiplier, surge_fee, dynamic_fare, \
     traffic, airport_rush, status, driver_id, driver_name, deposit_paid, amount_paid, \
     balance_due, tip_amount, cancellation_fee, provider_order_id, payment_url, reminder_sent, \
     on_my_way_sent, customer_rating, driver_rating, feedback, created_at, updated_at";

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                     ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32,
                     ?33, ?34, ?35, ?36, ?37, ?38)"
        ),
        params![
            booking.id,
            booking.customer_name,
            booking.email,
            booking.phone,
            booking.pickup_location,
            booking.dropoff_location,
            booking.pickup_datetime.format(DATETIME_FMT).to_string(),
            booking.passengers,
            booking.flight_number,
            booking.notes,
            booking.distance_miles,
            booking.duration_minutes,
            round_money(booking.base_fare),
            round_money(booking.airport_fee),
            round_money(booking.time_fee),
            round_money(booking.passenger_fee),
            booking.surge_multiplier,
            round_money(booking.surge_fee),
            round_money(booking.dynamic_fare),
            booking.traffic.as_str(),
            booking.airport_rush as i32,
            booking.status.as_str(),
            booking.driver_id,
            booking.driver_name,
            booking.deposit_paid as i32,
            round_money(booking.amount_paid),
            round_money(booking.balance_due),
            booking.tip_amount.map(round_money),
            booking.cancellation_fee.map(round_money),
            booking.provider_order_id,
            booking.payment_url,
            booking.reminder_sent as i32,
            booking.on_my_way_sent as i32,
            booking.customer_rating,
            booking.driver_rating,
            booking.feedback,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// Persist the mutable lifecycle fields of a booking. Immutable
/// creation fields are deliberately not part of the update.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            status = ?1, driver_id = ?2, driver_name = ?3, deposit_paid = ?4,
            amount_paid = ?5, balance_due = ?6, tip_amount = ?7, cancellation_fee = ?8,
            provider_order_id = ?9, payment_url = ?10, reminder_sent = ?11,
            on_my_way_sent = ?12, customer_rating = ?13, driver_rating = ?14,
            feedback = ?15, updated_at = ?16
         WHERE id = ?17",
        params![
            booking.status.as_str(),
            booking.driver_id,
            booking.driver_name,
            booking.deposit_paid as i32,
            round_money(booking.amount_paid),
            round_money(booking.balance_due),
            booking.tip_amount.map(round_money),
            booking.cancellation_fee.map(round_money),
            booking.provider_order_id,
            booking.payment_url,
            booking.reminder_sent as i32,
            booking.on_my_way_sent as i32,
            booking.customer_rating,
            booking.driver_rating,
            booking.feedback,
            booking.updated_at.format(DATETIME_FMT).to_string(),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 \
                 ORDER BY pickup_datetime DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 ORDER BY pickup_datetime DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let pickup_str: String = row.get(6)?;
    let traffic_str: String = row.get(19)?;
    let status_str: String = row.get(21)?;
    let created_str: String = row.get(36)?;
    let updated_str: String = row.get(37)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        pickup_location: row.get(4)?,
        dropoff_location: row.get(5)?,
        pickup_datetime: parse_dt(&pickup_str),
        passengers: row.get(7)?,
        flight_number: row.get(8)?,
        notes: row.get(9)?,
        distance_miles: row.get(10)?,
        duration_minutes: row.get(11)?,
        base_fare: row.get(12)?,
        airport_fee: row.get(13)?,
        time_fee: row.get(14)?,
        passenger_fee: row.get(15)?,
        surge_multiplier: row.get(16)?,
        surge_fee: row.get(17)?,
        dynamic_fare: row.get(18)?,
        traffic: TrafficLevel::parse(&traffic_str),
        airport_rush: row.get::<_, i32>(20)? != 0,
        status: BookingStatus::parse(&status_str),
        driver_id: row.get(22)?,
        driver_name: row.get(23)?,
        deposit_paid: row.get::<_, i32>(24)? != 0,
        amount_paid: row.get(25)?,
        balance_due: row.get(26)?,
        tip_amount: row.get(27)?,
        cancellation_fee: row.get(28)?,
        provider_order_id: row.get(29)?,
        payment_url: row.get(30)?,
        reminder_sent: row.get::<_, i32>(31)? != 0,
        on_my_way_sent: row.get::<_, i32>(32)? != 0,
        customer_rating: row.get(33)?,
        driver_rating: row.get(34)?,
        feedback: row.get(35)?,
        created_at: parse_dt(&created_str),
        updated_at: parse_dt(&updated_str),
    })
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Drivers ──

pub fn upsert_driver(conn: &Connection, driver: &Driver) -> anyhow::Result<()> {
    let days_json = serde_json::to_string(&driver.days_of_week)?;
    conn.execute(
        "INSERT INTO drivers (id, name, phone, email, status, rating, total_rides,
                              vehicle_make, vehicle_model, vehicle_year, vehicle_color,
                              vehicle_plate, start_time, end_time, days_of_week)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           phone = excluded.phone,
           email = excluded.email,
           status = excluded.status,
           rating = excluded.rating,
           total_rides = excluded.total_rides,
           vehicle_make = excluded.vehicle_make,
           vehicle_model = excluded.vehicle_model,
           vehicle_year = excluded.vehicle_year,
           vehicle_color = excluded.vehicle_color,
           vehicle_plate = excluded.vehicle_plate,
           start_time = excluded.start_time,
           end_time = excluded.end_time,
           days_of_week = excluded.days_of_week",
        params![
            driver.id,
            driver.name,
            driver.phone,
            driver.email,
            driver.status.as_str(),
            driver.rating,
            driver.total_rides,
            driver.vehicle.make,
            driver.vehicle.model,
            driver.vehicle.year,
            driver.vehicle.color,
            driver.vehicle.plate,
            driver.start_time,
            driver.end_time,
            days_json,
        ],
    )?;
    Ok(())
}

pub fn list_drivers(conn: &Connection) -> anyhow::Result<Vec<Driver>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, email, status, rating, total_rides, vehicle_make,
                vehicle_model, vehicle_year, vehicle_color, vehicle_plate, start_time,
                end_time, days_of_week
         FROM drivers ORDER BY rating DESC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_driver_row(row)))?;

    let mut drivers = vec![];
    for row in rows {
        drivers.push(row??);
    }
    Ok(drivers)
}

pub fn update_driver_status(
    conn: &Connection,
    id: &str,
    status: DriverStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE drivers SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_driver_row(row: &rusqlite::Row) -> anyhow::Result<Driver> {
    let status_str: String = row.get(4)?;
    let days_json: String = row.get(14)?;
    let days_of_week: Vec<u32> = serde_json::from_str(&days_json).unwrap_or_default();

    Ok(Driver {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        status: DriverStatus::parse(&status_str),
        rating: row.get(5)?,
        total_rides: row.get(6)?,
        vehicle: Vehicle {
            make: row.get(7)?,
            model: row.get(8)?,
            year: row.get(9)?,
            color: row.get(10)?,
            plate: row.get(11)?,
        },
        start_time: row.get(12)?,
        end_time: row.get(13)?,
        days_of_week,
    })
}

// ── Applied payments (webhook idempotency ledger) ──

/// Record a payment transaction. Returns false when the transaction id
/// was already applied, which callers treat as a replayed delivery.
pub fn record_payment(
    conn: &Connection,
    transaction_id: &str,
    booking_id: &str,
    amount: f64,
    kind: &str,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO applied_payments (transaction_id, booking_id, amount, kind)
         VALUES (?1, ?2, ?3, ?4)",
        params![transaction_id, booking_id, round_money(amount), kind],
    )?;
    Ok(count > 0)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub pending_count: i64,
    pub upcoming_confirmed_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub available_drivers: i64,
    pub revenue_collected: f64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

    let count_status = |status: &str| -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )
        .unwrap_or(0)
    };

    let upcoming_confirmed_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings WHERE pickup_datetime > ?1 AND status = 'confirmed'",
            params![now],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let available_drivers: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM drivers WHERE status = 'available'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let revenue_collected: f64 = conn
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM applied_payments",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0.0);

    Ok(DashboardStats {
        pending_count: count_status("pending"),
        upcoming_confirmed_count,
        completed_count: count_status("completed"),
        cancelled_count: count_status("cancelled"),
        available_drivers,
        revenue_collected,
    })
}
