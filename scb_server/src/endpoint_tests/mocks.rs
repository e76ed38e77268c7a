use mockall::mock;
use shopify_tools::{CommerceOrders, CreatedOrder, NewShopifyOrder, ShopifyApiError};
use stripe_tools::{CheckoutSession, CheckoutSessions, NewSessionParams, StripeApiError};

mock! {
    pub PaymentProcessor {}

    impl CheckoutSessions for PaymentProcessor {
        async fn create_checkout_session(&self, params: &NewSessionParams) -> Result<CheckoutSession, StripeApiError>;
        async fn fetch_session_expanded(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError>;
    }
}

mock! {
    pub CommerceBackend {}

    impl CommerceOrders for CommerceBackend {
        async fn create_order(&self, order: &NewShopifyOrder) -> Result<CreatedOrder, ShopifyApiError>;
    }
}
