use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Day of week, 0 = Sunday through 6 = Saturday.
pub type DayIndex = u8;

pub const DAY_NAMES: [&str; 7] = [
    "Domingo",
    "Segunda-feira",
    "Terça-feira",
    "Quarta-feira",
    "Quinta-feira",
    "Sexta-feira",
    "Sábado",
];

pub fn day_name(day: DayIndex) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("?")
}

/// Weekday index of a calendar date, using the same 0 = Sunday convention as `Slot::day`.
pub fn day_index(date: NaiveDate) -> DayIndex {
    date.weekday().num_days_from_sunday() as DayIndex
}

/// `"HH:00"` label for an hour of the day.
pub fn hour_label(hour: u8) -> String {
    format!("{hour:02}:00")
}

/// Recurring weekly position of a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub day: DayIndex,
    /// `"HH:MM"`.
    pub time: String,
}

impl Slot {
    pub fn new(day: DayIndex, time: impl Into<String>) -> Self {
        Self {
            day,
            time: time.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        (self.day as usize) < DAY_NAMES.len() && !self.time.trim().is_empty()
    }

    /// Human-readable form used in messages, e.g. `"Quarta-feira às 10:00"`.
    pub fn describe(&self) -> String {
        format!("{} às {}", day_name(self.day), self.time)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Scheduled,
    /// Superseded by a reschedule; kept as a marker, not a live slot.
    RescheduledSource,
    /// The live booking produced by the latest reschedule of a chain.
    RescheduledTarget,
}

impl BookingStatus {
    pub fn is_live(self) -> bool {
        !matches!(self, BookingStatus::RescheduledSource)
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::RescheduledSource => "rescheduled_source",
            BookingStatus::RescheduledTarget => "rescheduled_target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Ulid,
    pub slot: Slot,
    pub student: String,
    pub instructor: String,
    #[serde(default)]
    pub status: BookingStatus,
    /// Root of the chain this booking replaces. Set only on `RescheduledTarget`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<Ulid>,
}

impl Booking {
    pub fn scheduled(id: Ulid, fields: BookingFields) -> Self {
        Self {
            id,
            slot: fields.slot,
            student: fields.student,
            instructor: fields.instructor,
            status: BookingStatus::Scheduled,
            original_id: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

/// Input for creating or rescheduling a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFields {
    pub slot: Slot,
    pub student: String,
    pub instructor: String,
}

impl BookingFields {
    pub fn new(slot: Slot, student: impl Into<String>, instructor: impl Into<String>) -> Self {
        Self {
            slot,
            student: student.into(),
            instructor: instructor.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.slot.is_valid() && !self.student.trim().is_empty() && !self.instructor.trim().is_empty()
    }
}

/// One instructor on one equipment item for one hourly slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Ulid,
    pub day: DayIndex,
    pub time: String,
    pub instructor: String,
    pub equipment: String,
}

/// Request to allocate `[start_hour, end_hour)` on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAllocation {
    pub day: DayIndex,
    pub instructor: String,
    pub equipment: String,
    pub start_hour: u8,
    pub end_hour: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Ulid,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub plan_expires_at: Option<NaiveDate>,
    #[serde(default)]
    pub monthly_fee: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Student {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            phone: None,
            email: None,
            birth_date: None,
            plan: None,
            plan_expires_at: None,
            monthly_fee: 0.0,
            active: true,
        }
    }

    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        self.birth_date
            .is_some_and(|b| b.month() == date.month() && b.day() == date.day())
    }

    /// Plan expires within `days` days of `today` (inclusive), and has not yet expired.
    pub fn plan_expires_within(&self, today: NaiveDate, days: u32) -> bool {
        self.plan_expires_at.is_some_and(|exp| {
            let left = (exp - today).num_days();
            (0..=i64::from(days)).contains(&left)
        })
    }
}

/// Agenda colour of an instructor. Closed set with a fixed palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructorColor {
    #[default]
    Teal,
    Rose,
    Amber,
    Violet,
    Sky,
    Lime,
    Slate,
}

impl InstructorColor {
    pub const ALL: [InstructorColor; 7] = [
        InstructorColor::Teal,
        InstructorColor::Rose,
        InstructorColor::Amber,
        InstructorColor::Violet,
        InstructorColor::Sky,
        InstructorColor::Lime,
        InstructorColor::Slate,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            InstructorColor::Teal => "#0d9488",
            InstructorColor::Rose => "#e11d48",
            InstructorColor::Amber => "#d97706",
            InstructorColor::Violet => "#7c3aed",
            InstructorColor::Sky => "#0284c7",
            InstructorColor::Lime => "#65a30d",
            InstructorColor::Slate => "#475569",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: Ulid,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub color: InstructorColor,
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl Instructor {
    pub fn new(name: impl Into<String>, color: InstructorColor) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            phone: None,
            color,
            specialties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    Reformer,
    Cadillac,
    Chair,
    Barrel,
    Mat,
    Tower,
}

impl EquipmentKind {
    pub fn label(self) -> &'static str {
        match self {
            EquipmentKind::Reformer => "Reformer",
            EquipmentKind::Cadillac => "Cadillac",
            EquipmentKind::Chair => "Chair",
            EquipmentKind::Barrel => "Barrel",
            EquipmentKind::Mat => "Mat",
            EquipmentKind::Tower => "Tower",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Ulid,
    pub name: String,
    pub kind: EquipmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Pix,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Ulid,
    pub student: String,
    pub amount: f64,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
}

// ── Settings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateKey {
    ClassReminder,
    ExpiryWarning,
    BirthdayMessage,
    PaymentConfirmation,
    WelcomeMessage,
    RescheduleNotification,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 6] = [
        TemplateKey::ClassReminder,
        TemplateKey::ExpiryWarning,
        TemplateKey::BirthdayMessage,
        TemplateKey::PaymentConfirmation,
        TemplateKey::WelcomeMessage,
        TemplateKey::RescheduleNotification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKey::ClassReminder => "classReminder",
            TemplateKey::ExpiryWarning => "expiryWarning",
            TemplateKey::BirthdayMessage => "birthdayMessage",
            TemplateKey::PaymentConfirmation => "paymentConfirmation",
            TemplateKey::WelcomeMessage => "welcomeMessage",
            TemplateKey::RescheduleNotification => "rescheduleNotification",
        }
    }
}

/// Message bodies with `{token}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageTemplates {
    pub class_reminder: String,
    pub expiry_warning: String,
    pub birthday_message: String,
    pub payment_confirmation: String,
    pub welcome_message: String,
    pub reschedule_notification: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            class_reminder: "Olá {nome}! Lembrete da sua aula de Pilates {dia} às {hora}. Até lá!".into(),
            expiry_warning: "Olá {nome}, seu plano vence em {vencimento}. Fale conosco para renovar.".into(),
            birthday_message: "Feliz aniversário, {nome}! Toda a equipe do {studio} deseja um ótimo dia.".into(),
            payment_confirmation: "Olá {nome}, recebemos seu pagamento de R$ {valor}. Obrigado!".into(),
            welcome_message: "Bem-vindo(a) ao {studio}, {nome}! Estamos felizes em ter você conosco.".into(),
            reschedule_notification: "Olá {nome}, sua aula foi remarcada para {novo_horario}.".into(),
        }
    }
}

impl MessageTemplates {
    pub fn get(&self, key: TemplateKey) -> &str {
        match key {
            TemplateKey::ClassReminder => &self.class_reminder,
            TemplateKey::ExpiryWarning => &self.expiry_warning,
            TemplateKey::BirthdayMessage => &self.birthday_message,
            TemplateKey::PaymentConfirmation => &self.payment_confirmation,
            TemplateKey::WelcomeMessage => &self.welcome_message,
            TemplateKey::RescheduleNotification => &self.reschedule_notification,
        }
    }

    pub fn longest(&self) -> usize {
        TemplateKey::ALL.iter().map(|k| self.get(*k).len()).max().unwrap_or(0)
    }
}

/// Simulated WhatsApp delivery switches. An unset per-template flag follows `enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WhatsAppSettings {
    pub enabled: bool,
    pub class_reminder: Option<bool>,
    pub expiry_warning: Option<bool>,
    pub birthday_message: Option<bool>,
    pub payment_confirmation: Option<bool>,
    pub welcome_message: Option<bool>,
    pub reschedule_notification: Option<bool>,
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            class_reminder: None,
            expiry_warning: None,
            birthday_message: None,
            payment_confirmation: None,
            welcome_message: None,
            reschedule_notification: None,
        }
    }
}

impl WhatsAppSettings {
    pub fn allows(&self, key: TemplateKey) -> bool {
        let flag = match key {
            TemplateKey::ClassReminder => self.class_reminder,
            TemplateKey::ExpiryWarning => self.expiry_warning,
            TemplateKey::BirthdayMessage => self.birthday_message,
            TemplateKey::PaymentConfirmation => self.payment_confirmation,
            TemplateKey::WelcomeMessage => self.welcome_message,
            TemplateKey::RescheduleNotification => self.reschedule_notification,
        };
        self.enabled && flag.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudioSettings {
    pub studio_name: String,
    /// Days before plan expiry at which a warning is sent.
    pub expiry_warning_days: u32,
    pub templates: MessageTemplates,
    pub whatsapp: WhatsAppSettings,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            studio_name: "Studio Pilates".into(),
            expiry_warning_days: 7,
            templates: MessageTemplates::default(),
            whatsapp: WhatsAppSettings::default(),
        }
    }
}

/// Whole per-tenant state. Persisted as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioState {
    pub bookings: Vec<Booking>,
    pub allocations: Vec<Allocation>,
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub equipment: Vec<Equipment>,
    pub payments: Vec<Payment>,
    pub settings: StudioSettings,
}

impl StudioState {
    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn student_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }
}

/// Broadcast after every committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    BookingCreated { booking: Booking },
    BookingRescheduled { root_id: Ulid, booking: Booking },
    BookingsDeleted { ids: Vec<Ulid>, restored: Option<Ulid> },
    AllocationsAdded { allocations: Vec<Allocation> },
    AllocationRemoved { id: Ulid },
    StudentSaved { student: Student },
    StudentRemoved { id: Ulid },
    InstructorSaved { instructor: Instructor },
    InstructorRemoved { id: Ulid },
    EquipmentSaved { equipment: Equipment },
    EquipmentRemoved { id: Ulid },
    PaymentRecorded { payment: Payment },
    SettingsUpdated,
}

// ── Query result types ───────────────────────────────────────────

/// A reschedule chain as visible in the store: the root and its live replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainView {
    pub root: Booking,
    pub live: Option<Booking>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub active_students: usize,
    pub live_bookings: usize,
    pub classes_today: usize,
    pub rescheduled_chains: usize,
    pub allocations_today: usize,
    pub revenue_this_month: f64,
    pub expiring_plans: usize,
}
