pub mod invoice;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod repository;

pub use invoice::{generate_invoice_number, generate_verification_code};
pub use lifecycle::{validate_payment_transition, validate_transition, OrderBook, OrderError};
pub use memory::MemoryOrderRepository;
pub use models::{compute_total, NewOrder, Order, OrderItem, OrderItemDraft, OrderStatus, PaymentStatus};
pub use repository::{OrderRepository, RepositoryError};
