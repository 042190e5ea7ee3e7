pub mod command;
pub mod component;
pub mod interaction;

pub use component::Component;
pub use interaction::{
    Interaction, InteractionResponse, InteractionResponseData, InteractionType,
};
