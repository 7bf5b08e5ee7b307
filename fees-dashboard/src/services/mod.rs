pub mod fees;
pub mod gateway;
pub mod receipt;
pub mod resume;
pub mod retry;

pub use fees::FeeStoreClient;
pub use gateway::{HostedGateway, PaymentGatewayPort};
pub use receipt::{receipt_file_name, ReceiptClient};
pub use resume::{MemoryResumeStore, RedisResumeStore, ResumeStore};
pub use retry::RetryConfig;
