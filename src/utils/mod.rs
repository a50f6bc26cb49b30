//! Utilitaires partagés: messages d'erreur, hachage des mots de passe,
//! jetons d'accès et validation des entrées.

pub mod error_messages;
pub mod password_utils;
pub mod token;
pub mod validation;
