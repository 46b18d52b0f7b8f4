/* src/cli/manifest/src/lib.rs */

pub mod jsonc;
mod mode;
mod source;
mod target;
mod transform;
mod validate;

pub use mode::{BuildMode, DevServerKind, DevServersAvailable};
pub use source::{
  AppleSettings, Background, ChromiumSettings, FamilySettings, GeckoSettings, ResourceGroup,
  SourceManifest, TargetSettings, VERSION_PLACEHOLDER,
};
pub use target::{Target, TargetBase, UnknownTarget};
pub use transform::{
  BETA_NAME_SUFFIX, GeckoIdentity, IdentityBlock, LOCAL_API_HOST_PERMISSION, SafariIdentity,
  TransformedManifest, WebAccessibleResources, transform,
};
pub use validate::validate;
