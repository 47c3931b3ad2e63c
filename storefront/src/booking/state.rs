//! Booking wizard state and actions.

use crate::city_gate::{CityInfo, ServiceArea};
use crate::error::ApiFailure;
use crate::slices::ui::Route;
use crate::validation::FieldErrors;
use cyclecare_api::{City, CityId, Customer, CycleId, CycleType, Order, OrderId, ServiceId, User, UserId};

/// Wizard step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WizardStep {
    /// Contact and address details
    #[default]
    CustomerDetails,
    /// Cycles to service, terms
    CycleDetails,
    /// Order placed; terminal for the session
    Confirmation,
}

impl WizardStep {
    /// Step `Back` leads to; `None` where going back is not allowed.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::CycleDetails => Some(Self::CustomerDetails),
            Self::CustomerDetails | Self::Confirmation => None,
        }
    }
}

/// Editable customer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerField {
    /// Given name
    FirstName,
    /// Family name
    LastName,
    /// Email
    Email,
    /// Phone, sanitized to 10 digits
    Phone,
    /// Address line 1
    AddressLine1,
    /// Address line 2
    AddressLine2,
    /// Landmark
    Landmark,
    /// Pincode, sanitized to 6 digits
    Pincode,
}

impl CustomerField {
    /// Key used in [`FieldErrors`].
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::AddressLine1 => "addressLine1",
            Self::AddressLine2 => "addressLine2",
            Self::Landmark => "landmark",
            Self::Pincode => "pincode",
        }
    }
}

/// Photo picked for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Name of the picked file
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// A cycle as entered in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDraft {
    /// Server id of a previously registered cycle
    pub id: Option<CycleId>,
    /// Brand / name
    pub brand: String,
    /// Bike type
    pub cycle_type: Option<CycleType>,
    /// Service to book for this cycle
    pub service: Option<ServiceId>,
    /// Whether this cycle is booked in this submission
    pub order: bool,
    /// Newly picked photo
    pub image: Option<ImageAttachment>,
    /// Photo already stored on the backend
    pub image_url: Option<String>,
}

impl Default for CycleDraft {
    fn default() -> Self {
        Self {
            id: None,
            brand: String::new(),
            cycle_type: None,
            service: None,
            order: true,
            image: None,
            image_url: None,
        }
    }
}

/// Change to one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEdit {
    /// Brand / name
    Brand(String),
    /// Bike type
    Type(CycleType),
    /// Service
    Service(ServiceId),
    /// Booked in this submission or not
    Ordered(bool),
    /// Attach a photo
    Image(ImageAttachment),
}

/// Booking wizard state.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingState {
    /// Current step
    pub step: WizardStep,
    /// Account the booking is made for
    pub user_id: Option<UserId>,
    /// Customer details being edited
    pub customer: Customer,
    /// City resolved from the pincode or the city picker
    pub city_info: Option<CityInfo>,
    /// Non-blocking pincode warning
    pub area_warning: Option<String>,
    /// Cycles in this submission
    pub cycles: Vec<CycleDraft>,
    /// Service preselected from the catalog
    pub service: Option<ServiceId>,
    /// Terms checkbox
    pub terms_accepted: bool,
    /// Validation errors of the last `Next`
    pub errors: FieldErrors,
    /// Request in flight
    pub submitting: bool,
    /// Error of the last request
    pub error: Option<String>,
    /// Order created by this wizard
    pub created_order: Option<OrderId>,
    /// Unexpected-state message, picked up by the fault panel
    pub fault: Option<String>,
    /// Cities known to the wizard
    pub area: ServiceArea,
}

impl Default for BookingState {
    fn default() -> Self {
        Self {
            step: WizardStep::default(),
            user_id: None,
            customer: Customer::default(),
            city_info: None,
            area_warning: None,
            cycles: vec![CycleDraft::default()],
            service: None,
            terms_accepted: false,
            errors: FieldErrors::default(),
            submitting: false,
            error: None,
            created_order: None,
            fault: None,
            area: ServiceArea::default(),
        }
    }
}

impl BookingState {
    /// Deep link to the created order.
    #[must_use]
    pub fn tracking_route(&self) -> Option<Route> {
        self.created_order.clone().map(Route::OrderTracking)
    }
}

/// Booking wizard actions.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingAction {
    /// Open the wizard, prefilled from the account
    Start {
        /// Signed-in account
        user: Option<User>,
        /// Service picked in the catalog
        service: Option<ServiceId>,
    },
    /// City list became available
    UseCities(Vec<City>),
    /// Customer input changed
    SetField {
        /// Field
        field: CustomerField,
        /// Raw input
        value: String,
    },
    /// City picked from the list
    SelectCity {
        /// City
        id: CityId,
    },
    /// Geolocation captured
    SetLocation {
        /// Latitude
        lat: f64,
        /// Longitude
        lng: f64,
    },
    /// Add an empty cycle
    AddCycle,
    /// Remove a cycle
    RemoveCycle {
        /// Position in the list
        index: usize,
    },
    /// Change a cycle
    EditCycle {
        /// Position in the list
        index: usize,
        /// Change
        edit: CycleEdit,
    },
    /// Terms checkbox toggled
    SetTermsAccepted(bool),
    /// Validate the current step and move on
    Next,
    /// Go to the previous step
    Back,
    /// Customer details stored
    CustomerSaved(User),
    /// Customer details could not be stored
    CustomerSaveFailed(ApiFailure),
    /// Order created
    OrderCreated(Order),
    /// Order could not be created
    OrderFailed(ApiFailure),
    /// Throw everything away and start over
    Reset,
}

impl BookingAction {
    /// Failure carried by this action, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::CustomerSaveFailed(failure) | Self::OrderFailed(failure) => Some(failure),
            _ => None,
        }
    }
}
