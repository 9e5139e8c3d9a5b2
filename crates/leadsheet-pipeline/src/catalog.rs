//! Static company seed lists, kept in the order the collector merges them.

use leadsheet_core::CompanySeed;
use leadsheet_core::Country::{self, Australia, NewZealand};
use leadsheet_core::Industry::{self, Both, Finance, Insurance};

const fn seed(
    company_name: &'static str,
    industry: Industry,
    country: Country,
    data_source: &'static str,
    company_website: &'static str,
) -> CompanySeed {
    CompanySeed {
        company_name,
        industry,
        country,
        data_source,
        company_website,
    }
}

/// Finance and insurance names listed on the ASX.
const ASX_LISTED: [CompanySeed; 10] = [
    seed("Commonwealth Bank", Finance, Australia, "ASX", "commbank.com.au"),
    seed("Westpac Banking Corporation", Finance, Australia, "ASX", "westpac.com.au"),
    seed("National Australia Bank", Finance, Australia, "ASX", "nab.com.au"),
    seed("ANZ Banking Group", Finance, Australia, "ASX", "anz.com.au"),
    seed("Macquarie Group", Finance, Australia, "ASX", "macquarie.com"),
    seed("QBE Insurance Group", Insurance, Australia, "ASX", "qbe.com"),
    seed("Insurance Australia Group", Insurance, Australia, "ASX", "iag.com.au"),
    seed("Suncorp Group", Both, Australia, "ASX", "suncorp.com.au"),
    seed("AMP Limited", Both, Australia, "ASX", "amp.com.au"),
    seed("Medibank Private", Insurance, Australia, "ASX", "medibank.com.au"),
];

const NZX_LISTED: [CompanySeed; 5] = [
    seed("Heartland Group Holdings", Finance, NewZealand, "NZX", "heartland.co.nz"),
    seed("Tower Limited", Insurance, NewZealand, "NZX", "tower.co.nz"),
    seed("Westpac Banking Corporation", Finance, NewZealand, "NZX", "westpac.co.nz"),
    seed("ANZ Bank New Zealand", Finance, NewZealand, "NZX", "anz.co.nz"),
    seed("Kiwibank", Finance, NewZealand, "NZX", "kiwibank.co.nz"),
];

const AU_FINANCE: [CompanySeed; 20] = [
    seed("Commonwealth Bank of Australia", Finance, Australia, "Sample Data", "commbank.com.au"),
    seed("Westpac Banking Corporation", Finance, Australia, "Sample Data", "westpac.com.au"),
    seed("National Australia Bank", Finance, Australia, "Sample Data", "nab.com.au"),
    seed("Australia and New Zealand Banking Group", Finance, Australia, "Sample Data", "anz.com.au"),
    seed("Macquarie Group", Finance, Australia, "Sample Data", "macquarie.com"),
    seed("Suncorp Group", Finance, Australia, "Sample Data", "suncorp.com.au"),
    seed("Bank of Queensland", Finance, Australia, "Sample Data", "boq.com.au"),
    seed("Bendigo and Adelaide Bank", Finance, Australia, "Sample Data", "bendigobank.com.au"),
    seed("AMP Limited", Finance, Australia, "Sample Data", "amp.com.au"),
    seed("Judo Bank", Finance, Australia, "Sample Data", "judo.bank"),
    seed("Tyro Payments", Finance, Australia, "Sample Data", "tyro.com"),
    seed("MyState Limited", Finance, Australia, "Sample Data", "mystate.com.au"),
    seed("Xinja Bank", Finance, Australia, "Sample Data", "xinja.com.au"),
    seed("86 400", Finance, Australia, "Sample Data", "86400.com.au"),
    seed("Volt Bank", Finance, Australia, "Sample Data", "voltbank.com.au"),
    seed("Heritage Bank", Finance, Australia, "Sample Data", "heritage.com.au"),
    seed("Teachers Mutual Bank", Finance, Australia, "Sample Data", "tmbank.com.au"),
    seed("Greater Bank", Finance, Australia, "Sample Data", "greater.com.au"),
    seed("IMB Bank", Finance, Australia, "Sample Data", "imb.com.au"),
    seed("Beyond Bank Australia", Finance, Australia, "Sample Data", "beyondbank.com.au"),
];

const AU_INSURANCE: [CompanySeed; 20] = [
    seed("QBE Insurance Group", Insurance, Australia, "Sample Data", "qbe.com"),
    seed("Insurance Australia Group", Insurance, Australia, "Sample Data", "iag.com.au"),
    seed("Suncorp Insurance", Insurance, Australia, "Sample Data", "suncorp.com.au"),
    seed("Allianz Australia", Insurance, Australia, "Sample Data", "allianz.com.au"),
    seed("Youi Insurance", Insurance, Australia, "Sample Data", "youi.com.au"),
    seed("Budget Direct", Insurance, Australia, "Sample Data", "budgetdirect.com.au"),
    seed("AAMI Insurance", Insurance, Australia, "Sample Data", "aami.com.au"),
    seed("NRMA Insurance", Insurance, Australia, "Sample Data", "nrma.com.au"),
    seed("Medibank Private", Insurance, Australia, "Sample Data", "medibank.com.au"),
    seed("Bupa Australia", Insurance, Australia, "Sample Data", "bupa.com.au"),
    seed("HCF", Insurance, Australia, "Sample Data", "hcf.com.au"),
    seed("NIB Health Funds", Insurance, Australia, "Sample Data", "nib.com.au"),
    seed("AIA Australia", Insurance, Australia, "Sample Data", "aia.com.au"),
    seed("TAL Life Limited", Insurance, Australia, "Sample Data", "tal.com.au"),
    seed("Zurich Australia", Insurance, Australia, "Sample Data", "zurich.com.au"),
    seed("MetLife Insurance Limited", Insurance, Australia, "Sample Data", "metlife.com.au"),
    seed("Chubb Insurance Australia", Insurance, Australia, "Sample Data", "chubb.com/au"),
    seed("RACQ Insurance", Insurance, Australia, "Sample Data", "racq.com.au/insurance"),
    seed("RACV Insurance", Insurance, Australia, "Sample Data", "racv.com.au/insurance"),
    seed("Hollard Insurance", Insurance, Australia, "Sample Data", "hollard.com.au"),
];

const NZ_FINANCE: [CompanySeed; 15] = [
    seed("ANZ Bank New Zealand", Finance, NewZealand, "Sample Data", "anz.co.nz"),
    seed("Westpac New Zealand", Finance, NewZealand, "Sample Data", "westpac.co.nz"),
    seed("Bank of New Zealand", Finance, NewZealand, "Sample Data", "bnz.co.nz"),
    seed("ASB Bank", Finance, NewZealand, "Sample Data", "asb.co.nz"),
    seed("Kiwibank", Finance, NewZealand, "Sample Data", "kiwibank.co.nz"),
    seed("TSB Bank", Finance, NewZealand, "Sample Data", "tsb.co.nz"),
    seed("Heartland Bank", Finance, NewZealand, "Sample Data", "heartland.co.nz"),
    seed("The Co-operative Bank", Finance, NewZealand, "Sample Data", "co-operativebank.co.nz"),
    seed("SBS Bank", Finance, NewZealand, "Sample Data", "sbsbank.co.nz"),
    seed("Rabobank New Zealand", Finance, NewZealand, "Sample Data", "rabobank.co.nz"),
    seed("HSBC New Zealand", Finance, NewZealand, "Sample Data", "hsbc.co.nz"),
    seed("China Construction Bank NZ", Finance, NewZealand, "Sample Data", "nz.ccb.com"),
    seed("Industrial and Commercial Bank of China NZ", Finance, NewZealand, "Sample Data", "icbcnz.com"),
    seed("Bank of China New Zealand", Finance, NewZealand, "Sample Data", "bankofchina.com/nz"),
    seed("Credit Union Baywide", Finance, NewZealand, "Sample Data", "nzcubaywide.co.nz"),
];

const NZ_INSURANCE: [CompanySeed; 15] = [
    seed("AA Insurance", Insurance, NewZealand, "Sample Data", "aainsurance.co.nz"),
    seed("Tower Insurance", Insurance, NewZealand, "Sample Data", "tower.co.nz"),
    seed("IAG New Zealand", Insurance, NewZealand, "Sample Data", "iag.co.nz"),
    seed("FMG Insurance", Insurance, NewZealand, "Sample Data", "fmg.co.nz"),
    seed("AMI Insurance", Insurance, NewZealand, "Sample Data", "ami.co.nz"),
    seed("State Insurance", Insurance, NewZealand, "Sample Data", "state.co.nz"),
    seed("Medical Assurance Society", Insurance, NewZealand, "Sample Data", "mas.co.nz"),
    seed("Vero Insurance", Insurance, NewZealand, "Sample Data", "vero.co.nz"),
    seed("Southern Cross Health Society", Insurance, NewZealand, "Sample Data", "southerncross.co.nz"),
    seed("AIA New Zealand", Insurance, NewZealand, "Sample Data", "aia.co.nz"),
    seed("Partners Life", Insurance, NewZealand, "Sample Data", "partnerslife.co.nz"),
    seed("Fidelity Life", Insurance, NewZealand, "Sample Data", "fidelitylife.co.nz"),
    seed("Cigna Life Insurance", Insurance, NewZealand, "Sample Data", "cigna.co.nz"),
    seed("Asteron Life", Insurance, NewZealand, "Sample Data", "asteronlife.co.nz"),
    seed("Accuro Health Insurance", Insurance, NewZealand, "Sample Data", "accuro.co.nz"),
];

/// Every seed list concatenated; names repeat across lists and are deduplicated later.
pub fn catalog() -> Vec<CompanySeed> {
    [
        &ASX_LISTED[..],
        &NZX_LISTED[..],
        &AU_FINANCE[..],
        &AU_INSURANCE[..],
        &NZ_FINANCE[..],
        &NZ_INSURANCE[..],
    ]
    .concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_starts_with_exchange_listings() {
        let seeds = catalog();
        assert_eq!(seeds.len(), 85);
        assert_eq!(seeds[0].company_name, "Commonwealth Bank");
        assert_eq!(seeds[7].company_name, "Suncorp Group");
        assert_eq!(seeds[7].industry, Industry::Both);
        assert_eq!(seeds[10].data_source, "NZX");
        assert_eq!(seeds[84].company_name, "Accuro Health Insurance");
    }

    #[test]
    fn every_seed_has_a_website() {
        assert!(catalog().iter().all(|s| !s.company_website.is_empty()));
    }
}
