//! The generic property Get/Set primitive.
//!
//! Every typed configuration operation on the session or a device is a thin
//! wrapper over these two calls. Each call is a self-contained asynchronous
//! request/response exchange delegated to the transport; several may be
//! outstanding concurrently and each resolves independently.

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{Property, PropertyId, PropertyValue};
use crate::transport::{PropertyTarget, Transport};

/// Issues property exchanges against a shared transport.
pub struct PropertyClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for PropertyClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> PropertyClient<T> {
    /// Creates a client over the given transport.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Returns the shared transport.
    pub(crate) fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Reads a property, checking the response value against the tag the
    /// identifier requires.
    pub async fn get(&self, target: PropertyTarget, id: PropertyId) -> Result<PropertyValue> {
        self.exchange_get(target, Property::get(id)).await
    }

    /// Reads a property whose request carries an argument (symbology
    /// selector, vendor command payload).
    pub async fn get_with(
        &self,
        target: PropertyTarget,
        id: PropertyId,
        argument: PropertyValue,
    ) -> Result<PropertyValue> {
        self.exchange_get(target, Property::get_with(id, argument))
            .await
    }

    /// Writes a property. The value tag is checked against the identifier
    /// before anything reaches the transport.
    pub async fn set(
        &self,
        target: PropertyTarget,
        id: PropertyId,
        value: PropertyValue,
    ) -> Result<()> {
        let request = Property::set(id, value)?;
        self.transport.set_property(target, request).await
    }

    async fn exchange_get(
        &self,
        target: PropertyTarget,
        request: Property,
    ) -> Result<PropertyValue> {
        let id = request.id;
        let response = self.transport.get_property(target, request).await?;
        if response.id != id {
            return Err(crate::error::Error::protocol(format!(
                "response for {:?} answers a request for {id:?}",
                response.id
            )));
        }
        response.value.expect_tag(id.value_tag())?;
        Ok(response.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::mock::MockTransport;
    use crate::types::VersionInfo;

    #[tokio::test]
    async fn test_get_checks_response_tag() {
        let (mock, _events) = MockTransport::new();
        mock.script_get(PropertyId::Version, PropertyValue::Byte(1));
        let client = PropertyClient::new(Arc::new(mock));

        let err = client
            .get(PropertyTarget::Session, PropertyId::Version)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_get_returns_typed_value() {
        let (mock, _events) = MockTransport::new();
        let version = VersionInfo {
            major: 1,
            middle: 0,
            minor: 4,
            build: 12,
        };
        mock.script_get(PropertyId::Version, PropertyValue::Version(version));
        let client = PropertyClient::new(Arc::new(mock));

        let value = client
            .get(PropertyTarget::Session, PropertyId::Version)
            .await
            .unwrap();
        assert_eq!(value.into_version().unwrap(), version);
    }

    #[tokio::test]
    async fn test_set_rejects_wrong_tag_before_transport() {
        let (mock, _events) = MockTransport::new();
        let mock = Arc::new(mock);
        let client = PropertyClient::new(Arc::clone(&mock));

        let err = client
            .set(
                PropertyTarget::Session,
                PropertyId::DataConfirmationMode,
                PropertyValue::String("companion".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
        assert_eq!(mock.property_call_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_verbatim() {
        let (mock, _events) = MockTransport::new();
        mock.fail_get(PropertyId::Battery, Error::Unspecified { code: -77 });
        let client = PropertyClient::new(Arc::new(mock));

        let err = client
            .get(PropertyTarget::Session, PropertyId::Battery)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Unspecified { code: -77 });
    }
}
