use crate::config::AttachmentMode;
use crate::domain::attachment::{estimated_kb, Attachment};
use crate::domain::quote::QuoteRequest;

const PREVIEW_CHARS: usize = 100;

/// Everything a transport needs to deliver one quote request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotePayload {
    pub submission_id: String,
    pub request: QuoteRequest,
    pub recipient: String,
    pub subject: String,
    pub reply_to: String,
    pub attachment_mode: AttachmentMode,
    pub attachments: Vec<PayloadAttachment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadAttachment {
    /// 1-based position, used for `image_N_*` field names.
    pub position: usize,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub estimated_kb: u64,
    /// Leading base64 characters, always present.
    pub preview: String,
    base64: Option<String>,
    source: Attachment,
    include_content: bool,
}

impl PayloadAttachment {
    fn new(position: usize, attachment: &Attachment, mode: AttachmentMode) -> Self {
        let encoded = attachment.to_base64();
        let preview = encoded.chars().take(PREVIEW_CHARS).collect();
        let include_content = mode == AttachmentMode::Full;

        Self {
            position,
            name: attachment.name.clone(),
            mime_type: attachment.mime_type.clone(),
            size_bytes: attachment.size_bytes,
            estimated_kb: estimated_kb(encoded.len()),
            preview,
            base64: include_content.then_some(encoded),
            source: attachment.clone(),
            include_content,
        }
    }

    pub fn size_label(&self) -> String {
        format!("{}KB", self.estimated_kb)
    }

    /// Full base64 content, `None` in metadata-only mode.
    pub fn base64(&self) -> Option<&str> {
        self.base64.as_deref()
    }

    /// Raw bytes, `None` in metadata-only mode.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.include_content.then(|| self.source.content())
    }

    pub fn data_uri(&self) -> Option<String> {
        self.base64.as_ref().map(|encoded| format!("data:{};base64,{encoded}", self.mime_type))
    }
}

impl QuotePayload {
    pub fn assemble(
        submission_id: impl Into<String>,
        request: &QuoteRequest,
        attachments: &[Attachment],
        recipient: impl Into<String>,
        attachment_mode: AttachmentMode,
    ) -> Self {
        let request = request.trimmed();
        let attachments = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| {
                PayloadAttachment::new(index + 1, attachment, attachment_mode)
            })
            .collect();

        Self {
            submission_id: submission_id.into(),
            subject: request.subject(),
            reply_to: request.contact.clone(),
            request,
            recipient: recipient.into(),
            attachment_mode,
            attachments,
        }
    }

    pub fn attachment_names(&self) -> Vec<&str> {
        self.attachments.iter().map(|attachment| attachment.name.as_str()).collect()
    }

    pub fn images_summary(&self) -> String {
        if self.attachments.is_empty() {
            return "No images uploaded".to_string();
        }
        format!("Images uploaded: {}", self.attachment_names().join(", "))
    }

    /// Plain-text attachment inventory for relays that cannot carry files.
    pub fn image_details(&self) -> Option<String> {
        if self.attachments.is_empty() {
            return None;
        }

        let mut details = String::from("=== UPLOADED IMAGES ===\n\n");
        for attachment in &self.attachments {
            details.push_str(&format!("Image {}:\n", attachment.position));
            details.push_str(&format!("- Filename: {}\n", attachment.name));
            details.push_str(&format!("- Type: {}\n", attachment.mime_type));
            details.push_str(&format!("- Size: {}\n", attachment.size_label()));
            details.push_str(&format!(
                "- Base64 Data: data:{};base64,{}...\n\n",
                attachment.mime_type, attachment.preview
            ));
        }
        Some(details)
    }
}

#[cfg(test)]
mod tests {
    use super::QuotePayload;
    use crate::config::AttachmentMode;
    use crate::domain::attachment::Attachment;
    use crate::domain::quote::QuoteRequest;

    fn request() -> QuoteRequest {
        QuoteRequest::new(" A Smith ", "SW1A 1AA", "a@x.com", "Old sofa, 2 chairs\n")
    }

    fn photos() -> Vec<Attachment> {
        vec![
            Attachment::new("sofa.jpg", "image/jpeg", vec![1; 3000]),
            Attachment::new("chairs.png", "image/png", vec![2; 10]),
        ]
    }

    #[test]
    fn assemble_trims_fields_and_derives_headers() {
        let payload =
            QuotePayload::assemble("sub-1", &request(), &[], "quotes@x.com", AttachmentMode::Full);

        assert_eq!(payload.request.name, "A Smith");
        assert_eq!(payload.request.details, "Old sofa, 2 chairs");
        assert_eq!(payload.subject, "New Waste Removal Quote Request - A Smith (SW1A 1AA)");
        assert_eq!(payload.reply_to, "a@x.com");
        assert_eq!(payload.images_summary(), "No images uploaded");
        assert!(payload.image_details().is_none());
    }

    #[test]
    fn full_mode_carries_content_with_positions() {
        let payload = QuotePayload::assemble(
            "sub-2",
            &request(),
            &photos(),
            "quotes@x.com",
            AttachmentMode::Full,
        );

        assert_eq!(payload.images_summary(), "Images uploaded: sofa.jpg, chairs.png");
        let first = &payload.attachments[0];
        assert_eq!(first.position, 1);
        assert_eq!(first.size_label(), "3KB");
        assert_eq!(first.bytes().map(<[u8]>::len), Some(3000));
        assert_eq!(first.base64().map(str::len), Some(4000));
        assert!(payload.attachments[1]
            .data_uri()
            .is_some_and(|uri| uri.starts_with("data:image/png;base64,")));
    }

    #[test]
    fn metadata_mode_keeps_only_preview() {
        let payload = QuotePayload::assemble(
            "sub-3",
            &request(),
            &photos(),
            "quotes@x.com",
            AttachmentMode::MetadataOnly,
        );

        let first = &payload.attachments[0];
        assert!(first.bytes().is_none());
        assert!(first.base64().is_none());
        assert_eq!(first.preview.len(), 100);

        let details = payload.image_details().expect("details for attachments");
        assert!(details.starts_with("=== UPLOADED IMAGES ===\n\nImage 1:\n- Filename: sofa.jpg\n"));
        assert!(details.contains("- Type: image/png\n"));
        assert!(details.contains("..."));
    }
}
