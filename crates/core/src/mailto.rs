//! `mailto:` fallback for customers who would rather send the request from
//! their own email client.

use crate::domain::attachment::Attachment;
use crate::domain::quote::QuoteRequest;

pub const MAILTO_OPENED_MESSAGE: &str = "Email client opened - please send the email manually.";

/// Plain-text body listing the request fields and uploaded image names.
pub fn mailto_body(request: &QuoteRequest, attachments: &[Attachment]) -> String {
    let mut body = String::from("New Waste Removal Quote Request\n\n");
    body.push_str(&format!("Name: {}\n", request.name));
    body.push_str(&format!("Postcode: {}\n", request.postcode));
    body.push_str(&format!("Contact: {}\n", request.contact));
    body.push_str(&format!("Details: {}\n\n", request.details));

    if attachments.is_empty() {
        body.push_str("No images uploaded.\n");
    } else {
        let names: Vec<&str> =
            attachments.iter().map(|attachment| attachment.name.as_str()).collect();
        body.push_str(&format!("Images uploaded: {}\n", names.join(", ")));
        body.push_str("Note: Images are attached to this form submission.\n");
    }
    body
}

pub fn compose_mailto(
    request: &QuoteRequest,
    attachments: &[Attachment],
    recipient: &str,
) -> String {
    let request = request.trimmed();
    let subject = request.subject();
    let body = mailto_body(&request, attachments);
    format!(
        "mailto:{recipient}?subject={}&body={}",
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}

#[cfg(test)]
mod tests {
    use super::{compose_mailto, mailto_body};
    use crate::domain::attachment::Attachment;
    use crate::domain::quote::QuoteRequest;

    fn request() -> QuoteRequest {
        QuoteRequest::new("A Smith", "SW1A 1AA", "a@x.com", "Old sofa, 2 chairs")
    }

    #[test]
    fn body_without_images_says_so() {
        let body = mailto_body(&request(), &[]);
        assert_eq!(
            body,
            "New Waste Removal Quote Request\n\nName: A Smith\nPostcode: SW1A 1AA\n\
             Contact: a@x.com\nDetails: Old sofa, 2 chairs\n\nNo images uploaded.\n"
        );
    }

    #[test]
    fn body_lists_image_names() {
        let photos = vec![
            Attachment::new("sofa.jpg", "image/jpeg", vec![1]),
            Attachment::new("chairs.png", "image/png", vec![2]),
        ];
        let body = mailto_body(&request(), &photos);
        assert!(body.contains("Images uploaded: sofa.jpg, chairs.png\n"));
    }

    #[test]
    fn link_percent_encodes_subject_and_body() {
        let link = compose_mailto(&request(), &[], "quotes@clear-away.co.uk");
        assert!(link.starts_with(concat!(
            "mailto:quotes@clear-away.co.uk?subject=",
            "New%20Waste%20Removal%20Quote%20Request%20-%20A%20Smith%20%28SW1A%201AA%29&body="
        )));
        assert!(link.contains("Name%3A%20A%20Smith%0A"));
        assert!(!link.contains(' '));
    }
}
