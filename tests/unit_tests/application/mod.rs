mod chat_service_test;
mod relay_event_test;
