pub mod whatsapp_client;
