//! Solidity interface of the EHRManagement contract.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract EHRManagement {
        struct Record {
            uint256 id;
            string recordData;
            uint256 timestamp;
            address addedBy;
        }

        function registerPatient(string name, address patientAddress) external;
        function addRecord(uint256 patientId, string recordData) external;
        function getPatientRecords(uint256 patientId) external view returns (Record[] memory);
        function getContractBalance() external view returns (uint256);
        function deposit(uint256 amount) external payable;
        function withdraw(uint256 amount) external;
        function patientCount() external view returns (uint256);
    }
}
