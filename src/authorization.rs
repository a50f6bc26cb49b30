//! Wrapper d'appel à Casbin pour la vérification des conventions
//! objet-action, plus les contrôles de rôle simples.

use casbin::CoreApi;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::{HealthPlan, RecordRef, Role, RowId, User};

/// Un enforcer Casbin
pub struct Enforcer(casbin::Enforcer);

type CasbinResult = Result<(), AccessDenied>;

/// Une erreur sans détails en cas d'accès refusé
#[derive(Debug, Error)]
#[error("Accès refusé.")]
pub struct AccessDenied;

/// What the policy knows about the requester.
#[derive(Debug, Serialize, Hash)]
struct Subject {
    id: RowId,
    admin: bool,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            admin: user.is_admin(),
        }
    }
}

/// Un contexte contenant une référence à un enforcer et à un sujet.
pub struct Context<'ctx> {
    enforcer: &'ctx Enforcer,
    subject: Subject,
}

impl Enforcer {
    /// Charge le modèle et la politique depuis des chemins choisis à l'exécution.
    pub async fn load(model: &str, policy: &str) -> Result<Self, casbin::Error> {
        let model = casbin::DefaultModel::from_file(model.to_owned()).await?;
        let adapter = casbin::FileAdapter::new(policy.to_owned());
        let mut enforcer = casbin::Enforcer::new(model, adapter).await?;
        enforcer.load_policy().await?;
        Ok(Enforcer(enforcer))
    }

    pub fn with_subject<'ctx>(&'ctx self, subject: &User) -> Context<'ctx> {
        Context {
            enforcer: self,
            subject: subject.into(),
        }
    }
}

impl std::fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Enforcer")
    }
}

impl Context<'_> {
    fn enforce<O>(&self, object: O, action: &str) -> CasbinResult
    where
        O: Serialize + std::fmt::Debug + std::hash::Hash,
    {
        let subject = &self.subject;

        info!(
            "Enforcing {}",
            json!({ "sub": subject, "obj": &object, "act": action })
        );

        match self.enforcer.0.enforce((subject, &object, action)) {
            Err(e) => {
                error!("Casbin error: {e:?}");
                Err(AccessDenied)
            }
            Ok(r) => {
                info!("Granted: {r}");
                if r {
                    Ok(())
                } else {
                    Err(AccessDenied)
                }
            }
        }
    }

    pub fn view_plan(&self, plan: &HealthPlan) -> CasbinResult {
        self.enforce(plan, "view-plan")
    }

    pub fn update_plan(&self, plan: &HealthPlan) -> CasbinResult {
        self.enforce(plan, "update-plan")
    }

    pub fn delete_plan(&self, plan: &HealthPlan) -> CasbinResult {
        self.enforce(plan, "delete-plan")
    }

    pub fn delete_record(&self, record: &RecordRef) -> CasbinResult {
        self.enforce(record, "delete-record")
    }
}

/// Vérifie que le rôle de l'utilisateur fait partie des rôles autorisés
pub fn require_role(user: &User, allowed: &[Role]) -> CasbinResult {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        warn!(
            "Role {} of user {} not in {:?}",
            user.role, user.username, allowed
        );
        Err(AccessDenied)
    }
}
