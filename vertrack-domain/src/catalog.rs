use crate::registry::{ComponentDescriptor, ComponentRegistry, RegistryError};
use vertrack_probes::{
    AsyncDrainProbe, CapabilityProbe, FilenameConventionProbe, ManifestFileProbe,
    PluginDataRule, VersionFilter,
};

pub const APPLOVIN_INTEGRATION_MANAGER: &str =
    "AppLovinMax.Scripts.IntegrationManager.Editor.AppLovinIntegrationManager";

/// Rule for the AppLovin plugin-data payload: adapters listed under
/// `MediatedNetworks` and `PartnerMicroSdks`, each with a `CurrentVersions.Unity` version.
pub fn applovin_plugin_data_rule() -> PluginDataRule {
    PluginDataRule {
        required_key: Some("AppLovinMax".to_string()),
        list_keys: vec!["MediatedNetworks".to_string(), "PartnerMicroSdks".to_string()],
        name_key: "DisplayName".to_string(),
        version_path: vec!["CurrentVersions".to_string(), "Unity".to_string()],
    }
}

/// The ad, analytics and attribution SDKs tracked out of the box, in output order.
pub fn builtin_registry() -> Result<ComponentRegistry, RegistryError> {
    ComponentRegistry::new()
        .with(
            ComponentDescriptor::new("AppLovinMAX", CapabilityProbe::new("MaxSdk", "Version"))
                .with_sub_versions(AsyncDrainProbe::new(
                    APPLOVIN_INTEGRATION_MANAGER,
                    "LoadPluginData",
                    applovin_plugin_data_rule(),
                )),
        )?
        .with(ComponentDescriptor::new(
            "GoogleAdMob",
            FilenameConventionProbe::new("**/GoogleMobileAds", "GoogleMobileAds", "txt"),
        ))?
        .with(ComponentDescriptor::new(
            "GoogleImmersiveAds",
            ManifestFileProbe::xml(
                "**/GoogleMobileAdsNative/Editor/GoogleMobileAdsNativeDependencies.xml",
                "androidPackage",
                "spec",
                "gson",
                ':',
            ),
        ))?
        .with(ComponentDescriptor::new(
            "Odeeo",
            CapabilityProbe::new("Odeeo.OdeeoSdk", "SDK_VERSION")
                .with_filter(VersionFilter::pattern(r"v(\d+\.\d+\.\d+)")?),
        ))?
        .with(ComponentDescriptor::new(
            "AmazonSdk",
            CapabilityProbe::new("AmazonConstants", "VERSION"),
        ))?
        .with(ComponentDescriptor::new(
            "AdjustSdk",
            ManifestFileProbe::json("**/Adjust/package.json", &["version"]),
        ))?
        .with(ComponentDescriptor::new(
            "FacebookSdk",
            CapabilityProbe::new("Facebook.Unity.FacebookSdkVersion", "Build"),
        ))?
        .with(
            ComponentDescriptor::new(
                "Firebase",
                ManifestFileProbe::xml(
                    "**/Firebase/Editor/AppDependencies.xml",
                    "androidPackage",
                    "spec",
                    "unity",
                    ':',
                ),
            )
            .with_sub_versions(FilenameConventionProbe::new(
                "**/Firebase/Editor",
                "Firebase",
                "txt",
            )),
        )
}
