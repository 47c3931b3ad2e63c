//! Packaging a booking as a multipart order form.

use super::state::{BookingState, CycleDraft, ImageAttachment};
use cyclecare_api::{CycleId, CycleType, FormFile, OrderForm, ServiceId, UserId};
use serde::Serialize;

/// Form field carrying the cycle photos.
pub const IMAGE_FIELD: &str = "images";

/// Per-cycle entry of the `cycles` form field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CycleEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a CycleId>,
    brand: &'a str,
    #[serde(rename = "type")]
    cycle_type: Option<CycleType>,
    service: Option<&'a ServiceId>,
    order: bool,
    image: Option<String>,
}

/// Lowercase ASCII words joined by `-`; `cycle` when nothing is left.
#[must_use]
pub fn slugify(input: &str) -> String {
    let words: Vec<String> = input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    if words.is_empty() {
        "cycle".to_string()
    } else {
        words.join("-")
    }
}

fn extension(image: &ImageAttachment) -> String {
    let from_name = image
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match image.content_type.to_ascii_lowercase().as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/heic" => "heic",
            _ => "jpg",
        }
        .to_string()
    })
}

/// Upload name of a cycle photo: `{cycleId-or-index}_{slugified-brand}.{ext}`.
#[must_use]
pub fn image_file_name(cycle: &CycleDraft, index: usize, image: &ImageAttachment) -> String {
    let prefix = cycle
        .id
        .as_ref()
        .map_or_else(|| index.to_string(), ToString::to_string);
    format!("{prefix}_{}.{}", slugify(&cycle.brand), extension(image))
}

/// Build the order submission for a validated wizard.
///
/// # Errors
///
/// Returns an error if the cycle list cannot be encoded as JSON.
pub fn build_order_form(state: &BookingState, user_id: &UserId) -> Result<OrderForm, serde_json::Error> {
    let customer = &state.customer;
    let mut form = OrderForm::default();

    form.text("userId", user_id.as_str());
    form.text("firstName", customer.first_name.trim());
    form.text("lastName", customer.last_name.trim());
    form.text("email", customer.email.trim());
    form.text("phone", customer.phone.as_str());
    form.text("addressLine1", customer.address_line1.trim());
    form.text("addressLine2", customer.address_line2.trim());
    form.text("landmark", customer.landmark.trim());
    if let Some(city) = customer.city {
        form.text("city", city.to_string());
    }
    form.text("pincode", customer.pincode.as_str());
    if let (Some(lat), Some(lng)) = (customer.lat, customer.lng) {
        form.text("lat", lat.to_string());
        form.text("lng", lng.to_string());
    }
    if let Some(service) = &state.service {
        form.text("service", service.as_str());
    }

    let mut entries = Vec::with_capacity(state.cycles.len());
    for (index, cycle) in state.cycles.iter().enumerate() {
        let image = match &cycle.image {
            Some(attachment) => {
                let file_name = image_file_name(cycle, index, attachment);
                form.files.push(FormFile {
                    field: IMAGE_FIELD.to_string(),
                    file_name: file_name.clone(),
                    content_type: attachment.content_type.clone(),
                    bytes: attachment.bytes.clone(),
                });
                Some(file_name)
            },
            None => cycle.image_url.clone(),
        };

        entries.push(CycleEntry {
            id: cycle.id.as_ref(),
            brand: cycle.brand.trim(),
            cycle_type: cycle.cycle_type,
            service: cycle.service.as_ref().or(state.service.as_ref()),
            order: cycle.order,
            image,
        });
    }
    form.text("cycles", serde_json::to_string(&entries)?);

    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cyclecare_api::{CityId, Customer};

    fn photo(file_name: &str, content_type: &str) -> ImageAttachment {
        ImageAttachment {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: b"jpeg".to_vec(),
        }
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Hero Sprint"), "hero-sprint");
        assert_eq!(slugify("  BSA / Ladybird  26\""), "bsa-ladybird-26");
        assert_eq!(slugify("Trek®"), "trek");
        assert_eq!(slugify("!!!"), "cycle");
    }

    #[test]
    fn image_names_prefer_cycle_id() {
        let image = photo("IMG_2024.JPG", "image/jpeg");
        let new_cycle = CycleDraft {
            brand: "Hero Sprint".to_string(),
            ..CycleDraft::default()
        };
        assert_eq!(image_file_name(&new_cycle, 1, &image), "1_hero-sprint.jpg");

        let known = CycleDraft {
            id: Some(CycleId::new("cyc-77")),
            ..new_cycle
        };
        assert_eq!(image_file_name(&known, 1, &image), "cyc-77_hero-sprint.jpg");
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        let cycle = CycleDraft {
            brand: "Btwin".to_string(),
            ..CycleDraft::default()
        };
        assert_eq!(image_file_name(&cycle, 0, &photo("blob", "image/png")), "0_btwin.png");
        assert_eq!(image_file_name(&cycle, 0, &photo("blob", "")), "0_btwin.jpg");
    }

    #[test]
    fn form_carries_address_and_cycles() {
        let state = BookingState {
            customer: Customer {
                address_line1: " 12 MG Road ".to_string(),
                city: Some(CityId::new(3)),
                pincode: "411057".to_string(),
                ..Customer::default()
            },
            service: Some(ServiceId::new("svc-basic")),
            cycles: vec![
                CycleDraft {
                    brand: "Hero Sprint".to_string(),
                    cycle_type: Some(CycleType::Gear),
                    image: Some(photo("bike.jpeg", "image/jpeg")),
                    ..CycleDraft::default()
                },
                CycleDraft {
                    id: Some(CycleId::new("cyc-2")),
                    brand: "Atlas".to_string(),
                    cycle_type: Some(CycleType::NonGear),
                    order: false,
                    image_url: Some("https://cdn.example.com/cyc-2.jpg".to_string()),
                    ..CycleDraft::default()
                },
            ],
            ..BookingState::default()
        };

        let form = build_order_form(&state, &UserId::new("user-1")).unwrap();
        assert_eq!(form.field("addressLine1"), Some("12 MG Road"));
        assert_eq!(form.field("city"), Some("3"));
        assert_eq!(form.field("pincode"), Some("411057"));
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].file_name, "0_hero-sprint.jpeg");

        let cycles: serde_json::Value = serde_json::from_str(form.field("cycles").unwrap()).unwrap();
        assert_eq!(cycles[0]["type"], "gear");
        assert_eq!(cycles[0]["service"], "svc-basic");
        assert_eq!(cycles[0]["image"], "0_hero-sprint.jpeg");
        assert_eq!(cycles[0]["order"], true);
        assert!(cycles[0].get("id").is_none());
        assert_eq!(cycles[1]["id"], "cyc-2");
        assert_eq!(cycles[1]["type"], "nonGear");
        assert_eq!(cycles[1]["order"], false);
        assert_eq!(cycles[1]["image"], "https://cdn.example.com/cyc-2.jpg");
    }
}
