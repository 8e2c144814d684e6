//! Leave payload, dates and timestamps
use super::error::ValidationError;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LeaveType {
    #[n(0)]
    Casual,
    #[n(1)]
    Sick,
    #[n(2)]
    Personal,
}

impl LeaveType {
    /// Short code used by the forms (`CL`, `SL`, `PL`)
    pub fn code(&self) -> &'static str {
        match self {
            LeaveType::Casual => "CL",
            LeaveType::Sick => "SL",
            LeaveType::Personal => "PL",
        }
    }
    pub fn display_name(&self) -> &'static str {
        match self {
            LeaveType::Casual => "Casual Leave",
            LeaveType::Sick => "Sick Leave",
            LeaveType::Personal => "Personal Leave",
        }
    }
}

impl FromStr for LeaveType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CL" => Ok(LeaveType::Casual),
            "SL" => Ok(LeaveType::Sick),
            "PL" => Ok(LeaveType::Personal),
            other => Err(ValidationError::UnknownLeaveType(other.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(TimeStamp)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// A calendar day without time of day, stored as days from the common era
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct LeaveDate(NaiveDate);

impl LeaveDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(LeaveDate)
    }
    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for LeaveDate {
    fn from(value: NaiveDate) -> Self {
        LeaveDate(value)
    }
}

impl<C> minicbor::Encode<C> for LeaveDate {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.i32(self.0.num_days_from_ce())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for LeaveDate {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let days = d.i32()?;

        NaiveDate::from_num_days_from_ce_opt(days)
            .map(LeaveDate)
            .ok_or(minicbor::decode::Error::message("day count out of range"))
    }
}

/// Counts Monday to Friday days in the inclusive range `start..=end`.
pub fn working_days(start: LeaveDate, end: LeaveDate) -> u32 {
    if end < start {
        return 0;
    }
    start
        .0
        .iter_days()
        .take_while(|day| *day <= end.0)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, Clone, Eq, PartialEq)]
pub struct Delegation {
    #[n(0)]
    pub project: String,
    #[n(1)]
    pub deadline: String,
    #[n(2)]
    pub delegated_to: String,
    #[n(3)]
    pub description: String,
}

impl Delegation {
    fn is_complete(&self) -> bool {
        !self.project.trim().is_empty()
            && !self.deadline.trim().is_empty()
            && !self.delegated_to.trim().is_empty()
    }
}

// Also used for constructing drafts
#[derive(minicbor::Encode, minicbor::Decode, Debug, Default, Clone, Eq, PartialEq)]
pub struct LeaveDetails {
    #[n(0)]
    pub leave_type: Option<LeaveType>,
    #[n(1)]
    pub start_date: Option<LeaveDate>,
    #[n(2)]
    pub end_date: Option<LeaveDate>,
    #[n(3)]
    pub reason: String,
    #[n(4)]
    pub address_during_leave: String,
    #[n(5)]
    pub emergency_contact_name: String,
    #[n(6)]
    pub emergency_contact_number: String,
    #[n(7)]
    pub delegation_of_duties: Vec<Delegation>,
    #[n(8)]
    pub attachment: Option<String>, // url returned by blob storage
}

impl LeaveDetails {
    /// Construct an empty draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_leave_type(mut self, leave_type: LeaveType) -> Self {
        self.leave_type = Some(leave_type);
        self
    }
    pub fn set_dates(mut self, start: LeaveDate, end: LeaveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
    pub fn set_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }
    pub fn set_address(mut self, address: &str) -> Self {
        self.address_during_leave = address.to_string();
        self
    }
    pub fn set_emergency_contact(mut self, name: &str, number: &str) -> Self {
        self.emergency_contact_name = name.to_string();
        self.emergency_contact_number = number.to_string();
        self
    }
    pub fn add_delegation(mut self, delegation: Delegation) -> Self {
        self.delegation_of_duties.push(delegation);
        self
    }
    pub fn set_attachment(mut self, url: &str) -> Self {
        self.attachment = Some(url.to_string());
        self
    }

    /// Checks every required field and returns the number of working days covered.
    pub fn validate(&self) -> Result<u32, ValidationError> {
        if self.leave_type.is_none() {
            return Err(ValidationError::MissingField("leave type"));
        }
        let start = self
            .start_date
            .ok_or(ValidationError::MissingField("start date"))?;
        let end = self
            .end_date
            .ok_or(ValidationError::MissingField("end date"))?;
        if end < start {
            return Err(ValidationError::EndBeforeStart);
        }
        if self.address_during_leave.trim().is_empty() {
            return Err(ValidationError::MissingField("address during leave"));
        }
        if self.emergency_contact_name.trim().is_empty() {
            return Err(ValidationError::MissingField("emergency contact name"));
        }
        if self.emergency_contact_number.trim().is_empty() {
            return Err(ValidationError::MissingField("emergency contact number"));
        }
        if !is_contact_number(&self.emergency_contact_number) {
            return Err(ValidationError::InvalidContactNumber);
        }
        if self.reason.trim().is_empty() {
            return Err(ValidationError::MissingField("reason"));
        }
        if let Some(index) = self
            .delegation_of_duties
            .iter()
            .position(|entry| !entry.is_complete())
        {
            return Err(ValidationError::IncompleteDelegation(index));
        }

        match working_days(start, end) {
            0 => Err(ValidationError::NoWorkingDays),
            days => Ok(days),
        }
    }
}

fn is_contact_number(number: &str) -> bool {
    number.len() == 10 && number.bytes().all(|b| b.is_ascii_digit())
}

/// Partial update of the descriptive fields of a pending request
#[derive(Debug, Default, Clone)]
pub struct LeavePatch {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<LeaveDate>,
    pub end_date: Option<LeaveDate>,
    pub reason: Option<String>,
    pub address_during_leave: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_number: Option<String>,
    pub delegation_of_duties: Option<Vec<Delegation>>,
    pub attachment: Option<String>,
}

impl LeavePatch {
    /// Applies the patch onto a copy of `details`.
    pub fn apply_to(&self, details: &LeaveDetails) -> LeaveDetails {
        let mut next = details.clone();
        if let Some(leave_type) = self.leave_type {
            next.leave_type = Some(leave_type);
        }
        if let Some(start) = self.start_date {
            next.start_date = Some(start);
        }
        if let Some(end) = self.end_date {
            next.end_date = Some(end);
        }
        if let Some(reason) = &self.reason {
            next.reason = reason.clone();
        }
        if let Some(address) = &self.address_during_leave {
            next.address_during_leave = address.clone();
        }
        if let Some(name) = &self.emergency_contact_name {
            next.emergency_contact_name = name.clone();
        }
        if let Some(number) = &self.emergency_contact_number {
            next.emergency_contact_number = number.clone();
        }
        if let Some(delegations) = &self.delegation_of_duties {
            next.delegation_of_duties = delegations.clone();
        }
        if let Some(url) = &self.attachment {
            next.attachment = Some(url.clone());
        }
        next
    }
}
